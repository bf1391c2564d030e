//! Ethdev event layout.
//!
//! Static registry mapping the semantic event and field kinds used by the
//! analyses to the string identifiers of the trace format. Nothing outside
//! this module hard-codes wire-format strings.

/* Event names */
const ETH_DEV_CONFIGURE: &str = "lib.ethdev.configure";
const ETH_DEV_RXQ_BURST: &str = "lib.ethdev.rx.burst";
const ETH_DEV_RXQ_BURST_EMPTY: &str = "lib.ethdev.rx.burst.empty";
const ETH_DEV_RXQ_BURST_NON_EMPTY: &str = "lib.ethdev.rx.burst.nonempty";
const ETH_DEV_TXQ_BURST: &str = "lib.ethdev.tx.burst";

/* Event field names */
const PORT_ID: &str = "port_id";
const QUEUE_ID: &str = "queue_id";
const NB_RX_Q: &str = "nb_rx_q";
const NB_TX_Q: &str = "nb_tx_q";
const NB_RX: &str = "nb_rx";
const NB_PKTS: &str = "nb_pkts";
const THREAD_NAME: &str = "context.name";
const CPU_ID: &str = "context.cpu_id";
const RC: &str = "rc";

/// Ethdev events understood by the analyses.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum EventKind {
    /// The application finished configuring an Ethernet device.
    Configure,
    /// A burst of packets was received.
    RxBurst,
    /// A receive poll returned no packet.
    RxBurstEmpty,
    /// A receive poll returned at least one packet.
    RxBurstNonEmpty,
    /// A burst of packets was sent.
    TxBurst,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Configure => ETH_DEV_CONFIGURE,
            EventKind::RxBurst => ETH_DEV_RXQ_BURST,
            EventKind::RxBurstEmpty => ETH_DEV_RXQ_BURST_EMPTY,
            EventKind::RxBurstNonEmpty => ETH_DEV_RXQ_BURST_NON_EMPTY,
            EventKind::TxBurst => ETH_DEV_TXQ_BURST,
        }
    }

    /// Resolve a trace event name. Returns `None` for events the analyses do
    /// not consume.
    pub fn of(name: &str) -> Option<EventKind> {
        match name {
            ETH_DEV_CONFIGURE => Some(EventKind::Configure),
            ETH_DEV_RXQ_BURST => Some(EventKind::RxBurst),
            ETH_DEV_RXQ_BURST_EMPTY => Some(EventKind::RxBurstEmpty),
            ETH_DEV_RXQ_BURST_NON_EMPTY => Some(EventKind::RxBurstNonEmpty),
            ETH_DEV_TXQ_BURST => Some(EventKind::TxBurst),
            _ => None,
        }
    }
}

/// Ethdev event fields understood by the analyses.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum FieldKind {
    /// Number identifying a NIC port.
    PortId,
    /// Number identifying a queue associated to a NIC port.
    QueueId,
    /// The number of configured Rx queues.
    NbRxQ,
    /// The number of configured Tx queues.
    NbTxQ,
    /// The number of packets received.
    NbRxPkts,
    /// The number of packets transmitted.
    NbTxPkts,
    /// The name of the thread issuing the event.
    ThreadName,
    /// The CPU on which the event was recorded.
    CpuId,
    /// Code indicating whether the operation was successful.
    Rc,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::PortId => PORT_ID,
            FieldKind::QueueId => QUEUE_ID,
            FieldKind::NbRxQ => NB_RX_Q,
            FieldKind::NbTxQ => NB_TX_Q,
            FieldKind::NbRxPkts => NB_RX,
            FieldKind::NbTxPkts => NB_PKTS,
            FieldKind::ThreadName => THREAD_NAME,
            FieldKind::CpuId => CPU_ID,
            FieldKind::Rc => RC,
        }
    }
}
