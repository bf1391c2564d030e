//! Utility types and functions.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;

use std::hash::Hash;
#[derive(Default)]
pub struct Dispatcher<K, V> {
    items: HashMap<K, V>,
}

impl<K, V> Dispatcher<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    pub fn get_or_new<F: FnOnce() -> V>(&mut self, k: &K, f: F) -> &mut V {
        self.items.entry(k.clone()).or_insert_with(f)
    }

    pub fn get(&self, k: &K) -> Option<&V> {
        self.items.get(k)
    }

    pub fn get_mut(&mut self, k: &K) -> Option<&mut V> {
        self.items.get_mut(k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.items.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.items.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.items.keys()
    }

    pub fn items(&self) -> impl Iterator<Item = (&K, &V)> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K, V> Dispatcher<K, V>
where
    K: Hash + Eq + Clone,
    V: Default,
{
    pub fn get_or_default(&mut self, k: &K) -> &mut V {
        self.items.entry(k.clone()).or_default()
    }
}

#[derive(Default)]
pub struct UpperBoundTracker<T> {
    max_val: Option<T>,
}

impl<T: Ord + Copy> UpperBoundTracker<T> {
    pub fn update(&mut self, new: T) -> T {
        let v = self.max_val.map_or(new, |prev| prev.max(new));
        self.max_val = Some(v);
        v
    }

    pub fn get(&self) -> Option<T> {
        self.max_val
    }
}

#[derive(Default)]
pub struct LowerBoundTracker<T> {
    min_val: Option<T>,
}

impl<T: Ord + Copy> LowerBoundTracker<T> {
    pub fn update(&mut self, new: T) -> T {
        let v = self.min_val.map_or(new, |prev| prev.min(new));
        self.min_val = Some(v);
        v
    }

    pub fn get(&self) -> Option<T> {
        self.min_val
    }
}

pub fn unique_json_filename<P: AsRef<Path>>(path: Option<P>) -> Option<PathBuf> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let date_format = format_description!("[year]_[month]_[day]_[hour][minute][second]");
    let formatted_date = now.format(&date_format).ok()?;

    let name = format!("pollscope_{}.json", formatted_date);

    let p = path
        .as_ref()
        .map(|t| t.as_ref().join(&name))
        .unwrap_or_else(|| PathBuf::from(&name));

    if !p.exists() {
        return Some(p);
    }

    for c in 'a'..='z' {
        let name = format!("pollscope_{}_{}.json", formatted_date, c);
        let p = path
            .as_ref()
            .map(|p| p.as_ref().join(&name))
            .unwrap_or_else(|| PathBuf::from(&name));

        if !p.exists() {
            return Some(p);
        }
    }

    None
}

pub struct InterleaveBy<F, I, J, T> {
    cmp: F,
    i: I,
    j: J,
    v_i: Option<T>,
    v_j: Option<T>,
    phantom: std::marker::PhantomData<T>,
}

impl<F, I, J, T> InterleaveBy<F, I, J, T>
where
    I: Iterator<Item = T>,
    J: Iterator<Item = T>,
    F: Fn(&T, &T) -> Ordering,
{
    pub fn new(i: I, j: J, cmp: F) -> Self {
        Self {
            cmp,
            i,
            j,
            v_i: None,
            v_j: None,
            phantom: std::marker::PhantomData,
        }
    }
}

impl<F, I, J, T> Iterator for InterleaveBy<F, I, J, T>
where
    I: Iterator<Item = T>,
    J: Iterator<Item = T>,
    F: Fn(&T, &T) -> Ordering,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.v_i = self.v_i.take().or_else(|| self.i.next());
        self.v_j = self.v_j.take().or_else(|| self.j.next());

        match (&self.v_i, &self.v_j) {
            (None, None) => None,
            (None, Some(_)) => self.v_j.take(),
            (Some(_), None) => self.v_i.take(),
            (Some(i), Some(j)) => {
                if (self.cmp)(i, j) == Ordering::Greater {
                    self.v_j.take()
                } else {
                    self.v_i.take()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::InterleaveBy;

    use super::{LowerBoundTracker, UpperBoundTracker};

    #[test]
    fn test_bound_trackers() {
        let mut lo = LowerBoundTracker::default();
        let mut hi = UpperBoundTracker::default();

        for v in [5i64, 2, 9, 7] {
            lo.update(v);
            hi.update(v);
        }

        assert_eq!(lo.get(), Some(2));
        assert_eq!(hi.get(), Some(9));
    }

    #[test]
    fn test_interleave() {
        let x1 = &[1, 3, 5];
        let x2 = &[2, 4, 6];

        let it = InterleaveBy::new(x1.iter(), x2.iter(), |a, b| a.cmp(b));

        let res: Vec<u32> = it.copied().collect();

        assert_eq!(res, &[1, 2, 3, 4, 5, 6]);

        let it = InterleaveBy::new(x1.iter(), x2.iter(), |a, b| b.cmp(a));

        let res: Vec<u32> = it.copied().collect();

        assert_eq!(res, &[2, 4, 6, 1, 3, 5]);

        let x1 = &[5, 3, 1];
        let x2 = &[6, 4, 2];

        let it = InterleaveBy::new(x1.iter(), x2.iter(), |a, b| b.cmp(a));

        let res: Vec<u32> = it.copied().collect();

        assert_eq!(res, &[6, 5, 4, 3, 2, 1]);
    }
}
