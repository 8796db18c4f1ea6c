//! An in-process stand-in for the remote story service.
//!
//! `MemoryApi` keeps accounts, tokens, stories and favorites in memory and
//! answers with the same error taxonomy as the real service, so session and
//! dispatcher code can be exercised without a network.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::task::Poll;

use async_trait::async_trait;

use crate::api::{AuthResponse, StoryApi, UserProfile};
use crate::error::{Error, Result};
use crate::session_store::Credential;
use crate::story::{NewStory, Story, StoryId};

struct Account {
    password: String,
    name: String,
    created_at: String,
    favorites: Vec<StoryId>,
}

#[derive(Default)]
struct ServerState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    // most recent first
    stories: Vec<Story>,
    clock: u64,
    // requests left to answer normally, then the error to fail with
    fail_after: Option<(usize, Error)>,
}

impl ServerState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn timestamp(&mut self) -> String {
        format!("2024-01-01T00:00:{:02}.000Z", self.tick() % 60)
    }

    fn authenticate(&self, credential: &Credential) -> Result<()> {
        match self.tokens.get(&credential.token) {
            Some(username) if username == &credential.username => Ok(()),
            _ => Err(Error::Auth("invalid token".into())),
        }
    }

    fn story(&self, story_id: &StoryId) -> Result<Story> {
        self.stories
            .iter()
            .find(|story| &story.id == story_id)
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no story with id {}", story_id),
            })
    }

    fn profile(&self, username: &str) -> Result<UserProfile> {
        let account = self
            .accounts
            .get(username)
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no user {}", username),
            })?;

        Ok(UserProfile {
            username: username.to_owned(),
            name: account.name.clone(),
            created_at: account.created_at.clone(),
            stories: self
                .stories
                .iter()
                .filter(|story| story.owner_username == username)
                .cloned()
                .collect(),
            favorites: account
                .favorites
                .iter()
                .filter_map(|id| self.story(id).ok())
                .collect(),
        })
    }

    fn issue_token(&mut self, username: &str) -> String {
        let token = format!("token-{}-{}", username, self.tick());
        self.tokens.insert(token.clone(), username.to_owned());
        token
    }
}

#[derive(Default)]
pub struct MemoryApi {
    state: RefCell<ServerState>,
    calls: Cell<usize>,
    latency: Cell<bool>,
}

impl MemoryApi {
    pub fn new() -> Self {
        MemoryApi::default()
    }

    pub fn add_user(&self, username: &str, password: &str, name: &str) {
        let mut state = self.state.borrow_mut();
        let created_at = state.timestamp();
        state.accounts.insert(
            username.to_owned(),
            Account {
                password: password.to_owned(),
                name: name.to_owned(),
                created_at,
                favorites: Vec::new(),
            },
        );
    }

    /// Adds a story as the newest in the feed.
    pub fn seed_story(&self, id: &str, title: &str, url: &str, owner: &str) {
        let mut state = self.state.borrow_mut();
        let created_at = state.timestamp();
        state.stories.insert(
            0,
            Story {
                id: id.into(),
                title: title.to_owned(),
                author: owner.to_owned(),
                url: url.to_owned(),
                owner_username: owner.to_owned(),
                created_at,
            },
        );
    }

    /// The next request fails with `err` before touching any server state.
    pub fn fail_next(&self, err: Error) {
        self.fail_after(0, err);
    }

    /// Lets `requests` more requests through, then fails the one after with `err`.
    pub fn fail_after(&self, requests: usize, err: Error) {
        self.state.borrow_mut().fail_after = Some((requests, err));
    }

    /// Makes every request suspend once before answering, like a real round trip.
    pub fn set_latency(&self, latency: bool) {
        self.latency.set(latency);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn story_exists(&self, story_id: &StoryId) -> bool {
        self.state.borrow().story(story_id).is_ok()
    }

    pub fn favorites_of(&self, username: &str) -> Vec<StoryId> {
        self.state
            .borrow()
            .accounts
            .get(username)
            .map(|account| account.favorites.clone())
            .unwrap_or_default()
    }

    async fn begin(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.latency.get() {
            yield_once().await;
        }
        let mut state = self.state.borrow_mut();
        match state.fail_after.take() {
            Some((0, err)) => Err(err),
            Some((left, err)) => {
                state.fail_after = Some((left - 1, err));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

async fn yield_once() {
    let mut yielded = false;
    futures::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

#[async_trait(?Send)]
impl StoryApi for MemoryApi {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.begin().await?;
        let mut state = self.state.borrow_mut();

        match state.accounts.get(username) {
            Some(account) if account.password == password => {}
            _ => return Err(Error::Auth("invalid username or password".into())),
        }

        let token = state.issue_token(username);
        let user = state.profile(username)?;
        Ok(AuthResponse { token, user })
    }

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<AuthResponse> {
        self.begin().await?;
        if self.state.borrow().accounts.contains_key(username) {
            return Err(Error::Validation(format!("username {} is taken", username)));
        }

        self.add_user(username, password, name);
        let mut state = self.state.borrow_mut();
        let token = state.issue_token(username);
        let user = state.profile(username)?;
        Ok(AuthResponse { token, user })
    }

    async fn get_user(&self, credential: &Credential) -> Result<UserProfile> {
        self.begin().await?;
        let state = self.state.borrow();
        state.authenticate(credential)?;
        state.profile(&credential.username)
    }

    async fn get_stories(&self) -> Result<Vec<Story>> {
        self.begin().await?;
        Ok(self.state.borrow().stories.clone())
    }

    async fn add_story(&self, credential: &Credential, story: &NewStory) -> Result<Story> {
        self.begin().await?;
        let mut state = self.state.borrow_mut();
        state.authenticate(credential)?;

        if story.title.is_empty() || story.url.is_empty() {
            return Err(Error::Validation("title and url are required".into()));
        }

        let n = state.tick();
        let created_at = state.timestamp();
        let story = Story {
            id: StoryId::new(format!("story-{}", n)),
            title: story.title.clone(),
            author: story.author.clone(),
            url: story.url.clone(),
            owner_username: credential.username.clone(),
            created_at,
        };
        state.stories.insert(0, story.clone());
        Ok(story)
    }

    async fn add_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<Story> {
        self.begin().await?;
        let mut state = self.state.borrow_mut();
        state.authenticate(credential)?;
        let story = state.story(story_id)?;

        if let Some(account) = state.accounts.get_mut(&credential.username) {
            if !account.favorites.contains(story_id) {
                account.favorites.push(story_id.clone());
            }
        }
        Ok(story)
    }

    async fn remove_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<()> {
        self.begin().await?;
        let mut state = self.state.borrow_mut();
        state.authenticate(credential)?;

        if let Some(account) = state.accounts.get_mut(&credential.username) {
            account.favorites.retain(|id| id != story_id);
        }
        Ok(())
    }

    async fn delete_story(&self, credential: &Credential, story_id: &StoryId) -> Result<()> {
        self.begin().await?;
        let mut state = self.state.borrow_mut();
        state.authenticate(credential)?;

        let story = state.story(story_id)?;
        if story.owner_username != credential.username {
            return Err(Error::Auth(format!("{} may not delete {}", credential.username, story_id)));
        }

        state.stories.retain(|story| &story.id != story_id);
        for account in state.accounts.values_mut() {
            account.favorites.retain(|id| id != story_id);
        }
        Ok(())
    }
}
