//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                        |
//! |------------|--------------|------------------------------------|
//! | `clock`    | Clock        | system wall clock                  |
//! | `store`    | Storage      | recovery file + session log on disk|
//! | `console`  | Presentation | the log facade                     |
//! | `latch`    | Guards       | operator enable latch              |
//! | `selftest` | SelfTest     | storage and clock probes           |

pub mod clock;
pub mod console;
pub mod latch;
pub mod selftest;
pub mod store;

pub use clock::SystemClock;
pub use console::LogPresenter;
pub use latch::LatchGuards;
pub use selftest::BasicSelfTest;
pub use store::FileStore;
