//! Sensor descriptor string parser.
//!
//! Format: sensors separated by `:`, the five fields of each sensor separated
//! by `,`, in order `world,model,name,link,kind`.
//!
//! ```text
//! w1,m1,cam0,topic0,camera:w1,m1,lidar0,topic1,lidar
//! ```
//!
//! Parsing never fails as a whole.  A chunk with the wrong field count is
//! logged once per distinct chunk and skipped; a chunk with an unknown kind
//! is logged and skipped.  Empty chunks (e.g. from a trailing `:`) are
//! ignored.
//!
//! The world name is read from the raw string, not the descriptors: the
//! first field of any non-empty chunk counts, even one that is later
//! rejected for its field count or kind.

use std::collections::HashSet;

use skybridge_types::{SensorDescriptor, SensorKind};
use tracing::{error, warn};

/// Separates sensors within the descriptor string.
pub const SENSOR_SEPARATOR: char = ':';
/// Separates fields within one sensor.
pub const FIELD_SEPARATOR: char = ',';
/// Number of fields in a well-formed sensor chunk.
pub const FIELD_COUNT: usize = 5;

/// Descriptor parser that remembers which malformed chunks it has already
/// reported.
#[derive(Debug, Default)]
pub struct SensorConfigParser {
    reported: HashSet<String>,
}

impl SensorConfigParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `config` into descriptors, in input order.
    pub fn parse(&mut self, config: &str) -> Vec<SensorDescriptor> {
        let mut descriptors = Vec::new();
        for chunk in config.split(SENSOR_SEPARATOR) {
            if chunk.is_empty() {
                continue;
            }
            let fields: Vec<&str> = chunk.split(FIELD_SEPARATOR).collect();
            if fields.len() != FIELD_COUNT {
                if self.reported.insert(chunk.to_string()) {
                    error!(
                        chunk,
                        fields = fields.len(),
                        "malformed sensor descriptor; expected {FIELD_COUNT} fields"
                    );
                }
                continue;
            }
            let Some(kind) = SensorKind::from_descriptor(fields[4]) else {
                warn!(chunk, kind = fields[4], "unknown sensor kind; skipped");
                continue;
            };
            descriptors.push(SensorDescriptor {
                world: fields[0].to_string(),
                model: fields[1].to_string(),
                name: fields[2].to_string(),
                link: fields[3].to_string(),
                kind,
            });
        }
        descriptors
    }

    /// Distinct malformed chunks reported so far.
    pub fn reported_count(&self) -> usize {
        self.reported.len()
    }
}

/// One-shot parse with a fresh parser.
pub fn parse_sensor_config(config: &str) -> Vec<SensorDescriptor> {
    SensorConfigParser::new().parse(config)
}

/// First non-empty world field among the chunks of `config`.
pub fn world_name(config: &str) -> Option<&str> {
    config
        .split(SENSOR_SEPARATOR)
        .filter_map(|chunk| chunk.split(FIELD_SEPARATOR).next())
        .find(|w| !w.is_empty())
}
