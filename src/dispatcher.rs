//! Turns UI intents into session and catalog operations.
//!
//! [`App`] owns the whole client state and runs one intent at a time through
//! `&mut self`. [`Dispatcher`] is the shared handle DOM closures hold; it
//! refuses an intent while another one is still waiting on the network.

use std::fmt;

use futures::lock::Mutex;
use log::{debug, info, warn};

use crate::api::StoryApi;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::session_store::{KeyValueStorage, SessionStore};
use crate::story::{NewStory, StoryId};
use crate::user::User;
use crate::view::{self, PageView, Panel};

/// Everything the page is rendered from. Replaced wholesale on logout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub user: Option<User>,
    pub catalog: Catalog,
    pub panel: Panel,
    /// Message from the last failed intent, cleared by the next success.
    pub notice: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Intent {
    Login {
        username: String,
        password: String,
    },
    Signup {
        username: String,
        password: String,
        name: String,
    },
    Logout,
    SubmitStory(NewStory),
    ToggleFavorite(StoryId),
    DeleteStory(StoryId),
    /// Refetch the feed and show it.
    ShowAll,
    Navigate(Panel),
    ToggleAuthForms,
}

impl fmt::Debug for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Login { username, .. } => write!(f, "Login({})", username),
            Intent::Signup { username, .. } => write!(f, "Signup({})", username),
            Intent::Logout => write!(f, "Logout"),
            Intent::SubmitStory(story) => write!(f, "SubmitStory({:?})", story.title),
            Intent::ToggleFavorite(id) => write!(f, "ToggleFavorite({})", id),
            Intent::DeleteStory(id) => write!(f, "DeleteStory({})", id),
            Intent::ShowAll => write!(f, "ShowAll"),
            Intent::Navigate(panel) => write!(f, "Navigate({:?})", panel),
            Intent::ToggleAuthForms => write!(f, "ToggleAuthForms"),
        }
    }
}

/// Parts of the page an intent changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dirty {
    pub feed: bool,
    pub own_stories: bool,
    pub favorites: bool,
    pub profile: bool,
    pub nav: bool,
    pub panel: bool,
    /// Clear the form the intent came from.
    pub reset_forms: bool,
}

impl Dirty {
    pub fn all() -> Self {
        Dirty {
            feed: true,
            own_stories: true,
            favorites: true,
            profile: true,
            nav: true,
            panel: true,
            reset_forms: true,
        }
    }

    fn user_lists() -> Self {
        Dirty {
            feed: true,
            own_stories: true,
            favorites: true,
            ..Dirty::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Dirty::default()
    }
}

pub struct App<A, S> {
    api: A,
    store: SessionStore<S>,
    state: AppState,
}

impl<A: StoryApi, S: KeyValueStorage> App<A, S> {
    pub fn new(api: A, store: SessionStore<S>) -> Self {
        App {
            api,
            store,
            state: AppState::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Tears the app down, keeping the API client.
    pub fn into_api(self) -> A {
        self.api
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn view(&self) -> PageView {
        view::page(&self.state)
    }

    /// Page load: resume a stored session if there is one, then fetch the feed.
    pub async fn start(&mut self) -> Result<Dirty> {
        // only a rejected token is forgotten; an offline start keeps it for
        // the next load
        let user = match self.store.load() {
            None => None,
            Some(credential) => match User::from_credential(&self.api, credential).await {
                Ok(user) => Some(user),
                Err(Error::Auth(message)) => {
                    info!("stored session is no longer valid: {}", message);
                    self.store.clear()?;
                    None
                }
                Err(err) => {
                    warn!("could not resume session: {}", err);
                    None
                }
            },
        };

        self.state = AppState {
            user,
            ..AppState::default()
        };
        self.refresh_catalog().await?;
        Ok(Dirty::all())
    }

    /// Runs one intent. On failure the state is left as it was and the error
    /// message becomes the page notice.
    pub async fn handle(&mut self, intent: Intent) -> Result<Dirty> {
        debug!("handling {:?}", intent);

        let result = self.run(intent).await;
        match &result {
            Ok(_) => self.state.notice = None,
            Err(err) => {
                warn!("intent failed: {}", err);
                self.state.notice = Some(err.to_string());
            }
        }
        result
    }

    async fn run(&mut self, intent: Intent) -> Result<Dirty> {
        match intent {
            Intent::Login { username, password } => {
                let user = User::login(&self.api, &username, &password).await?;
                self.log_in(user)
            }
            Intent::Signup {
                username,
                password,
                name,
            } => {
                let user = User::create(&self.api, &username, &password, &name).await?;
                self.log_in(user)
            }
            Intent::Logout => self.log_out().await,
            Intent::SubmitStory(story) => self.submit_story(story).await,
            Intent::ToggleFavorite(story_id) => self.toggle_favorite(story_id).await,
            Intent::DeleteStory(story_id) => self.delete_story(story_id).await,
            Intent::ShowAll => {
                self.refresh_catalog().await?;
                self.state.panel = Panel::AllStories;
                Ok(Dirty {
                    feed: true,
                    panel: true,
                    ..Dirty::default()
                })
            }
            Intent::Navigate(panel) => self.navigate(panel),
            Intent::ToggleAuthForms => {
                self.state.panel = match self.state.panel {
                    Panel::Auth => Panel::AllStories,
                    _ => Panel::Auth,
                };
                Ok(Dirty {
                    panel: true,
                    ..Dirty::default()
                })
            }
        }
    }

    async fn refresh_catalog(&mut self) -> Result<()> {
        self.state.catalog = Catalog::fetch_all(&self.api).await?;
        Ok(())
    }

    // persist first so a storage failure leaves the old identity in place
    fn log_in(&mut self, user: User) -> Result<Dirty> {
        self.store.save(Some(&user.credential()))?;
        info!("{} is now the current user", user.username);
        self.state.user = Some(user);
        self.state.panel = Panel::AllStories;
        Ok(Dirty::all())
    }

    async fn log_out(&mut self) -> Result<Dirty> {
        self.store.clear()?;
        if let Some(user) = self.state.user.take() {
            info!("{} logged out", user.username);
        }
        // the identity is gone once storage is cleared; a failed refetch
        // only leaves the previous feed in place, now without stars
        let catalog = std::mem::take(&mut self.state.catalog);
        self.state = AppState {
            catalog,
            ..AppState::default()
        };
        if let Err(err) = self.refresh_catalog().await {
            warn!("could not refresh feed after logout: {}", err);
        }
        Ok(Dirty::all())
    }

    async fn submit_story(&mut self, new_story: NewStory) -> Result<Dirty> {
        let story = Catalog::submit(&self.api, self.state.user.as_ref(), &new_story).await?;

        if let Some(user) = self.state.user.as_mut() {
            user.own_stories.insert(story.clone());
        }

        if let Err(err) = self.refresh_catalog().await {
            warn!("could not refresh feed after submit: {}", err);
            self.state.catalog.push_newest(story);
        }
        self.state.panel = Panel::AllStories;

        Ok(Dirty {
            feed: true,
            own_stories: true,
            panel: true,
            reset_forms: true,
            ..Dirty::default()
        })
    }

    async fn toggle_favorite(&mut self, story_id: StoryId) -> Result<Dirty> {
        let user = self.state.user.as_mut().ok_or_else(Error::not_logged_in)?;

        if user.is_favorite(&story_id) {
            user.delete_favorite(&self.api, &story_id).await?;
        } else {
            user.add_favorite(&self.api, &story_id).await?;
        }
        Ok(Dirty::user_lists())
    }

    async fn delete_story(&mut self, story_id: StoryId) -> Result<Dirty> {
        let user = self.state.user.as_mut().ok_or_else(Error::not_logged_in)?;
        user.delete_story(&self.api, &story_id).await?;
        self.state.catalog.remove(&story_id);
        Ok(Dirty::user_lists())
    }

    fn navigate(&mut self, panel: Panel) -> Result<Dirty> {
        if panel.needs_user() && self.state.user.is_none() {
            return Err(Error::not_logged_in());
        }
        self.state.panel = panel;
        Ok(Dirty {
            panel: true,
            ..Dirty::default()
        })
    }
}

#[derive(Debug)]
pub enum Dispatched {
    /// Another intent is in flight; this one was dropped.
    Busy,
    Done {
        result: Result<Dirty>,
        view: PageView,
    },
}

/// Shared, single-flight front for an [`App`].
pub struct Dispatcher<A, S> {
    app: Mutex<App<A, S>>,
}

impl<A: StoryApi, S: KeyValueStorage> Dispatcher<A, S> {
    pub fn new(app: App<A, S>) -> Self {
        Dispatcher {
            app: Mutex::new(app),
        }
    }

    /// Waits for any in-flight intent, then runs the page-load sequence.
    pub async fn start(&self) -> (Result<Dirty>, PageView) {
        let mut app = self.app.lock().await;
        let result = app.start().await;
        (result, app.view())
    }

    pub async fn dispatch(&self, intent: Intent) -> Dispatched {
        let Some(mut app) = self.app.try_lock() else {
            debug!("busy, dropping {:?}", intent);
            return Dispatched::Busy;
        };

        let result = app.handle(intent).await;
        Dispatched::Done {
            result,
            view: app.view(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.app.try_lock().is_none()
    }

    /// Runs `f` against the app once no intent is in flight.
    pub async fn inspect<R>(&self, f: impl FnOnce(&App<A, S>) -> R) -> R {
        let app = self.app.lock().await;
        f(&app)
    }
}
