//! Recorded trace reader.
//!
//! A trace folder contains one `*.events.json` file per recording stream,
//! each holding events sorted by timestamp. The reader merges the streams
//! into a single stream ordered by timestamp before feeding the processor.

use std::{
    cmp::Ordering,
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};

use crate::{
    context::Context, events::TraceEvent, utils::InterleaveBy, CancelToken, EventProcessor,
    EventSource,
};

struct TraceEvents<R: BufRead> {
    lines: Lines<R>,
}

impl<R: BufRead> TraceEvents<R> {
    #[inline]
    fn is_start_line(line: &str) -> bool {
        line.trim() == "["
    }

    #[inline]
    fn is_end_line(line: &str) -> bool {
        line.trim() == "]"
    }

    fn parse_line(maybe_line: Result<String>) -> Result<TraceEvent> {
        let line = maybe_line?;
        let start = line
            .find('{')
            .ok_or_else(|| anyhow::anyhow!("Record start ('{{') not found in line: {}", line))?;
        let end = line
            .rfind('}')
            .ok_or_else(|| anyhow::anyhow!("Record end ('}}') not found in line: {}", line))?
            + 1;
        let event: TraceEvent = serde_json::from_str(&line[start..end])?;
        Ok(event)
    }

    fn next_line(&mut self) -> Option<Result<String>> {
        let res_line = self.lines.next()?;
        match res_line {
            Ok(ref line) if Self::is_start_line(line) => self.next_line(),
            Ok(ref line) if Self::is_end_line(line) => None,
            _ => Some(res_line.map_err(anyhow::Error::from)),
        }
    }
}

impl<R: BufRead> Iterator for TraceEvents<R> {
    type Item = Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().map(Self::parse_line)
    }
}

impl<R: BufRead> From<R> for TraceEvents<R> {
    fn from(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

/// Errors surface immediately, real events merge by timestamp.
fn order_events(a: &Result<TraceEvent>, b: &Result<TraceEvent>) -> Ordering {
    match (a, b) {
        (Err(_), _) => Ordering::Less,
        (_, Err(_)) => Ordering::Greater,
        (Ok(a), Ok(b)) => a.ts.cmp(&b.ts),
    }
}

type EventStream<'a> = Box<dyn Iterator<Item = Result<TraceEvent>> + 'a>;

fn merge_streams<'a>(streams: Vec<EventStream<'a>>) -> EventStream<'a> {
    let mut merged: EventStream<'a> = Box::new(std::iter::empty());

    for stream in streams {
        merged = Box::new(InterleaveBy::new(merged, stream, order_events));
    }

    merged
}

pub struct TraceReader {
    dir: PathBuf,
}

impl TraceReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            dir: path.as_ref().to_path_buf(),
        }
    }

    fn event_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.dir.join("*.events.json");

        let mut files = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            files.push(entry?);
        }
        files.sort();

        if files.is_empty() {
            bail!("no event files found in {}", self.dir.display());
        }

        Ok(files)
    }

    fn merged_events(&self) -> Result<EventStream<'static>> {
        let mut streams: Vec<EventStream<'static>> = Vec::new();

        for path in self.event_files()? {
            let file = File::open(&path)?;
            streams.push(Box::new(TraceEvents::from(BufReader::new(file))));
        }

        Ok(merge_streams(streams))
    }
}

impl EventSource for TraceReader {
    fn event_loop<E: EventProcessor>(
        &mut self,
        processor: &mut E,
        ctx: &Context,
        cancel: &CancelToken,
    ) -> Result<()> {
        for event in self.merged_events()? {
            if cancel.is_cancelled() {
                break;
            }

            processor.consume_event(event?, ctx)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::PathBuf;

    use anyhow::Result;

    use crate::{
        context::Context, events::TraceEvent, CancelToken, EventProcessor, EventSource,
    };

    use super::{merge_streams, EventStream, TraceEvents, TraceReader};

    fn stream(body: &str) -> EventStream<'static> {
        Box::new(TraceEvents::from(Cursor::new(body.to_string())))
    }

    #[test]
    fn test_json_lines_skip_array_brackets() {
        let body = r#"[
{"ts": 10, "event": "lib.ethdev.rx.burst"},
{"ts": 20, "event": "lib.ethdev.rx.burst"}
]"#;

        let events: Vec<_> = stream(body).map(Result::unwrap).collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ts, 10);
        assert_eq!(events[1].ts, 20);
    }

    #[test]
    fn test_trailing_commas_are_tolerated() {
        let body = r#"{"ts": 10, "event": "a"},
{"ts": 20, "event": "b"},"#;

        let events: Vec<_> = stream(body).map(Result::unwrap).collect();

        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_streams_merge_by_timestamp() {
        let a = stream(
            r#"{"ts": 10, "event": "a"}
{"ts": 30, "event": "a"}"#,
        );
        let b = stream(
            r#"{"ts": 20, "event": "b"}
{"ts": 40, "event": "b"}"#,
        );
        let c = stream(r#"{"ts": 25, "event": "c"}"#);

        let merged: Vec<i64> = merge_streams(vec![a, b, c])
            .map(|e| e.unwrap().ts)
            .collect();

        assert_eq!(merged, vec![10, 20, 25, 30, 40]);
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let body = r#"{"ts": 10, "event": "a"}
not json at all"#;

        let res: Vec<_> = stream(body).collect();

        assert_eq!(res.len(), 2);
        assert!(res[0].is_ok());
        assert!(res[1].is_err());
    }

    /// Records consumed timestamps; optionally raises a cancel token after
    /// the nth event.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<i64>,
        cancel_at: usize,
        token: Option<CancelToken>,
    }

    impl EventProcessor for Recorder {
        fn pre_load_init(&mut self, _ctx: &Context) -> Result<()> {
            Ok(())
        }

        fn consume_event(&mut self, event: TraceEvent, _ctx: &Context) -> Result<()> {
            self.seen.push(event.ts);

            if let Some(token) = &self.token {
                if self.seen.len() == self.cancel_at {
                    token.cancel();
                }
            }

            Ok(())
        }

        fn finalize(&mut self, _ctx: &Context) -> Result<()> {
            Ok(())
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pollscope_reader_{}_{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_directory_discovery_and_merge() {
        let dir = scratch_dir("discovery");

        fs::write(
            dir.join("a.events.json"),
            "{\"ts\": 10, \"event\": \"a\"}\n{\"ts\": 30, \"event\": \"a\"}\n",
        )
        .unwrap();
        fs::write(dir.join("b.events.json"), "{\"ts\": 20, \"event\": \"b\"}\n").unwrap();
        // only *.events.json files are picked up
        fs::write(dir.join("notes.txt"), "not a trace").unwrap();

        let recorder = TraceReader::new(&dir)
            .process_events(Recorder::default(), &Context::default(), &CancelToken::new())
            .unwrap();

        assert_eq!(recorder.seen, vec![10, 20, 30]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_cancellation_stops_consumption() {
        let dir = scratch_dir("cancel");

        fs::write(
            dir.join("a.events.json"),
            "{\"ts\": 10, \"event\": \"a\"}\n{\"ts\": 20, \"event\": \"a\"}\n{\"ts\": 30, \"event\": \"a\"}\n",
        )
        .unwrap();

        // a pre-cancelled token stops the loop before the first event
        let cancel = CancelToken::new();
        cancel.cancel();

        let recorder = TraceReader::new(&dir)
            .process_events(Recorder::default(), &Context::default(), &cancel)
            .unwrap();
        assert!(recorder.seen.is_empty());

        // a token raised mid-stream stops at the next event boundary
        let cancel = CancelToken::new();
        let recorder = Recorder {
            cancel_at: 2,
            token: Some(cancel.clone()),
            ..Default::default()
        };

        let recorder = TraceReader::new(&dir)
            .process_events(recorder, &Context::default(), &cancel)
            .unwrap();
        assert_eq!(recorder.seen, vec![10, 20]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
