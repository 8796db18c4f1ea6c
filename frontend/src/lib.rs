extern crate console_error_panic_hook;
extern crate log;
extern crate story_feed;

pub mod events;
pub mod page;
pub mod storage;

use std::rc::Rc;

use log::{warn, LevelFilter, Log, Metadata, Record};
use story_feed::{App, Config, Dispatcher, HttpApi, SessionStore};
use wasm_bindgen::prelude::*;

use crate::page::Page;
use crate::storage::LocalStorage;

pub type ClientDispatcher = Dispatcher<HttpApi, LocalStorage>;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(contents: &str);
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            console_log(&format!("[{}] {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

pub fn init_logger(level: LevelFilter) {
    // a second bootstrap keeps the logger it already has
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Entry point called from the page. `config_json` overrides any of the
/// `Config` fields.
#[wasm_bindgen]
pub fn bootstrap(config_json: Option<String>) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    let parsed = config_json.as_deref().map(Config::from_json);
    let config = match &parsed {
        Some(Ok(config)) => config.clone(),
        _ => Config::default(),
    };
    init_logger(config.level_filter());
    if let Some(Err(err)) = parsed {
        warn!("ignoring invalid config: {}", err);
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let storage =
        LocalStorage::from_window(&window).map_err(|err| JsValue::from_str(&err.to_string()))?;

    let app = App::new(
        HttpApi::new(config.api_base_url.clone()),
        SessionStore::new(storage, &config),
    );
    let dispatcher = Rc::new(Dispatcher::new(app));
    let page = Rc::new(Page::locate(document)?);

    events::bind(page.clone(), dispatcher.clone())?;
    events::start(page, dispatcher);
    Ok(())
}
