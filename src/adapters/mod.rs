//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                     |
//! |------------|--------------|---------------------------------|
//! | `hardware` | OutputPort   | relays (GPIO), servos (LEDC)    |
//! | `log_sink` | EventSink    | Serial log output               |
//! | `rtdb`     | StreamSource | Firebase RTDB SSE streams       |
//! |            | BackendPort  | Firebase RTDB readiness probe   |
//! | `time`     | Clock        | ESP32 system timer, FreeRTOS    |
//! | `wifi`     | NetworkPort  | ESP-IDF WiFi STA                |

pub mod hardware;
pub mod log_sink;
pub mod rtdb;
pub mod time;
pub mod wifi;
