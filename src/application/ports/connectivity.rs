/// Platform-level connectivity signal, forwarded by the host shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}
