//! Wire envelope for the metrics forwarder.
//!
//! ```json
//! {"applications":[{"id":"…","instances":[{"id":"…","index":"…","metrics":[…]}]}]}
//! ```

use serde::Serialize;

use crate::DataPoint;

/// Who the batch is reported on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub app_id: String,
    pub instance_id: String,
    pub instance_index: String,
}

#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub applications: [Application<'a>; 1],
}
impl<'a> Payload<'a> {
    pub fn new(points: &'a [DataPoint], identity: &'a Identity) -> Self {
        let instance = Instance {
            id: &identity.instance_id,
            index: &identity.instance_index,
            metrics: points,
        };
        let application = Application {
            id: &identity.app_id,
            instances: [instance],
        };
        Self {
            applications: [application],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Serialize)]
pub struct Application<'a> {
    pub id: &'a str,
    pub instances: [Instance<'a>; 1],
}

#[derive(Debug, Serialize)]
pub struct Instance<'a> {
    pub id: &'a str,
    pub index: &'a str,
    pub metrics: &'a [DataPoint],
}
