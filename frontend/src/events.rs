use std::rc::Rc;

use log::{error, warn};
use story_feed::{Dirty, Dispatched, Intent, NewStory, Panel, StoryId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlFormElement};

use crate::page::Page;
use crate::ClientDispatcher;

/// What a click on an element means, from its id, its classes and the id of
/// the story it sits in.
pub fn click_intent(
    target_id: &str,
    has_class: impl Fn(&str) -> bool,
    story_id: Option<String>,
) -> Option<Intent> {
    let intent = match target_id {
        "nav-all" => Intent::ShowAll,
        "nav-submit" => Intent::Navigate(Panel::SubmitStory),
        "nav-favorites" => Intent::Navigate(Panel::Favorites),
        "nav-my-stories" => Intent::Navigate(Panel::OwnStories),
        "nav-user-profile" => Intent::Navigate(Panel::Profile),
        "nav-login" => Intent::ToggleAuthForms,
        "nav-logout" => Intent::Logout,
        _ => {
            let story_id = StoryId::new(story_id.filter(|id| !id.is_empty())?);
            if has_class("fa-star") {
                Intent::ToggleFavorite(story_id)
            } else if has_class("fa-trash-alt") {
                Intent::DeleteStory(story_id)
            } else {
                return None;
            }
        }
    };
    Some(intent)
}

fn intent_for_target(target: &Element) -> Option<Intent> {
    let story_id = target
        .closest("li")
        .ok()
        .flatten()
        .map(|item| item.id());
    let classes = target.class_list();
    click_intent(&target.id(), |class| classes.contains(class), story_id)
}

fn report(result: Result<(), JsValue>) {
    if let Err(err) = result {
        error!("could not update the page: {:?}", err);
    }
}

/// Runs `intent` in the background and redraws what it changed.
pub fn run(page: Rc<Page>, dispatcher: Rc<ClientDispatcher>, intent: Intent) {
    if dispatcher.is_busy() {
        warn!("ignoring {:?} while a request is in flight", intent);
        return;
    }

    spawn_local(async move {
        report(page.set_busy(true));
        match dispatcher.dispatch(intent).await {
            Dispatched::Busy => {}
            Dispatched::Done { result, view } => {
                report(page.set_busy(false));
                let dirty = result.unwrap_or_default();
                report(page.render(&view, dirty));
            }
        }
    });
}

/// Page load: restore the session, fetch the feed, draw everything.
pub fn start(page: Rc<Page>, dispatcher: Rc<ClientDispatcher>) {
    spawn_local(async move {
        report(page.set_busy(true));
        let (result, view) = dispatcher.start().await;
        report(page.set_busy(false));
        report(page.render(&view, Dirty::all()));

        if let Err(err) = result {
            warn!("startup incomplete: {}", err);
            report(page.render_notice(Some(&err.to_string())));
        }
    });
}

fn on_submit(
    form: &HtmlFormElement,
    page: Rc<Page>,
    dispatcher: Rc<ClientDispatcher>,
    read: fn(&Page) -> Result<Intent, JsValue>,
) -> Result<(), JsValue> {
    let onsubmit = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.prevent_default();

        match read(&page) {
            Ok(intent) => run(page.clone(), dispatcher.clone(), intent),
            Err(err) => error!("could not read form: {:?}", err),
        }
    });

    form.add_event_listener_with_callback("submit", onsubmit.as_ref().unchecked_ref())?;
    onsubmit.forget();
    Ok(())
}

fn read_login(page: &Page) -> Result<Intent, JsValue> {
    Ok(Intent::Login {
        username: page.input_value("login-username")?,
        password: page.input_value("login-password")?,
    })
}

fn read_signup(page: &Page) -> Result<Intent, JsValue> {
    Ok(Intent::Signup {
        name: page.input_value("create-account-name")?,
        username: page.input_value("create-account-username")?,
        password: page.input_value("create-account-password")?,
    })
}

fn read_story(page: &Page) -> Result<Intent, JsValue> {
    Ok(Intent::SubmitStory(NewStory {
        author: page.input_value("author")?,
        title: page.input_value("title")?,
        url: page.input_value("url")?,
    }))
}

pub fn bind(page: Rc<Page>, dispatcher: Rc<ClientDispatcher>) -> Result<(), JsValue> {
    on_submit(page.login_form(), page.clone(), dispatcher.clone(), read_login)?;
    on_submit(
        page.create_account_form(),
        page.clone(),
        dispatcher.clone(),
        read_signup,
    )?;
    on_submit(page.submit_form(), page.clone(), dispatcher.clone(), read_story)?;

    // one delegated listener covers nav links, stars and trash cans,
    // including ones rendered after binding
    let body = page.body().clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let target = match event.target().and_then(|t| t.dyn_into::<Element>().ok()) {
            Some(target) => target,
            None => return,
        };

        if let Some(intent) = intent_for_target(&target) {
            event.prevent_default();
            run(page.clone(), dispatcher.clone(), intent);
        }
    });

    body.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}
