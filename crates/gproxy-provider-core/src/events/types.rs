use serde::{Deserialize, Serialize};

use crate::record::RequestRecord;

/// One terminal transition (success, error, or cancel) ready for fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Terminal(RequestRecord),
}
