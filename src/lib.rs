extern crate async_trait;
extern crate futures;
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

pub mod api;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod session_store;
pub mod story;
pub mod testing;
pub mod user;
pub mod view;

pub use api::{HttpApi, StoryApi};
pub use catalog::Catalog;
pub use config::Config;
pub use dispatcher::{App, AppState, Dirty, Dispatched, Dispatcher, Intent};
pub use error::{Error, Result};
pub use session_store::{Credential, KeyValueStorage, MemoryStorage, SessionStore};
pub use story::{NewStory, Story, StoryId, StorySet};
pub use user::User;
pub use view::{ListView, PageView, Panel, StoryView};

#[cfg(test)]
pub fn init_logger() {
    use std::io::Write;

    let _ = env_logger::builder()
        .is_test(true)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
