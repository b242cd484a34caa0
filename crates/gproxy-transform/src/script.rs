//! Script hook contract: an optional per-provider override of any of the
//! four hooks. The scripting engine itself is out of scope here — only the
//! ctx API surface a script would see is specified, as closures standing in
//! for whatever embeds a sandboxed runtime (no network, no filesystem,
//! bounded CPU per request) in a full deployment.

use bytes::Bytes;

use crate::uif::{UifRequest, UifResponse};

type RequestOutHook = Box<dyn Fn(&Bytes) -> Option<UifRequest> + Send + Sync>;
type RequestInHook = Box<dyn Fn(&UifRequest) -> Option<Bytes> + Send + Sync>;
type ResponseInHook = Box<dyn Fn(&Bytes) -> Option<UifResponse> + Send + Sync>;
type ResponseOutHook = Box<dyn Fn(&UifResponse) -> Option<Bytes> + Send + Sync>;

/// Attached to a provider; any hook left `None` falls back to the hardcoded
/// codec for that slot, per the pipeline's fallback rule.
#[derive(Default)]
pub struct ScriptHooks {
    pub request_out: Option<RequestOutHook>,
    pub request_in: Option<RequestInHook>,
    pub response_in: Option<ResponseInHook>,
    pub response_out: Option<ResponseOutHook>,
}

impl ScriptHooks {
    pub fn request_out(&self, body: &Bytes) -> Option<UifRequest> {
        self.request_out.as_ref().and_then(|f| f(body))
    }

    pub fn request_in(&self, uif: &UifRequest) -> Option<Bytes> {
        self.request_in.as_ref().and_then(|f| f(uif))
    }

    pub fn response_in(&self, body: &Bytes) -> Option<UifResponse> {
        self.response_in.as_ref().and_then(|f| f(body))
    }

    pub fn response_out(&self, uif: &UifResponse) -> Option<Bytes> {
        self.response_out.as_ref().and_then(|f| f(uif))
    }
}
