//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements        | Connects to                    |
//! |--------------|-------------------|--------------------------------|
//! | `log_sink`   | EventSink         | `log` facade                   |
//! | `permission` | PermissionPort    | implicit grant / user prompt   |
//! | `sim_audio`  | AudioPort         | in-memory audio graph recorder |
//! | `sim_sensor` | MotionSensorPort  | scripted motion feed           |

pub mod log_sink;
pub mod permission;
pub mod sim_audio;
pub mod sim_sensor;
