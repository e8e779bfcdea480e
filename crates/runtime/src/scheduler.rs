/// Handle for one scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

/// Single-slot scheduler standing in for a display-refresh callback queue.
///
/// At most one request is pending. A new request cancels the unfired one, so
/// any burst of requests between two frames collapses into a single callback.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Option<FrameRequest>,
    issued: u64,
    cancelled: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) -> FrameRequest {
        if self.pending.take().is_some() {
            self.cancelled += 1;
        }
        self.issued += 1;
        let request = FrameRequest(self.issued);
        self.pending = Some(request);
        request
    }

    /// Cancels the pending request, if any.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.pending.take().is_some();
        if cancelled {
            self.cancelled += 1;
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Frame boundary: hands out the pending request to run.
    pub fn take_due(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    /// Requests superseded or cancelled before their frame.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}
