//! desktop-pilot: streaming orchestration for a model that drives a remote desktop.
//!
//! An exchange takes a client conversation, streams a tool-calling model
//! response, runs the `computer` and `bash` tools against a
//! [`DesktopSession`](desktop::DesktopSession) while the response is still
//! arriving, and writes every event to the client as a `data: <json>\n\n`
//! frame. If the exchange fails, the session is killed.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use desktop_pilot::prelude::*;
//!
//! # async fn example(session: Arc<dyn DesktopSession>, body: &str) -> desktop_pilot::error::Result<()> {
//! let orchestrator = Orchestrator::from_config(PilotConfig::from_env()?)?;
//! let request: ExchangeRequest = serde_json::from_str(body)?;
//!
//! match orchestrator.start(request, session).await {
//!     Ok(handle) => {
//!         let (frames, control) = handle.split();
//!         // stream `frames` to the client, then:
//!         # drop(frames);
//!         let outcome = control.wait().await;
//!         println!("{outcome:?}");
//!     }
//!     Err(err) => {
//!         // respond with err.status() and err.body()
//!         eprintln!("{err}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decoder;
pub mod desktop;
pub mod error;
pub mod exchange;
pub mod normalize;
pub mod prelude;
pub mod protocol;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;
