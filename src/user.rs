use log::{debug, info, warn};

use crate::api::{AuthResponse, StoryApi, UserProfile};
use crate::error::{Error, Result};
use crate::session_store::Credential;
use crate::story::{Story, StoryId, StorySet};

/// The logged-in identity. Own stories and favorites are independent sets;
/// a story can be in both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub name: String,
    pub created_at: String,
    pub login_token: String,
    pub own_stories: StorySet,
    pub favorites: StorySet,
}

impl User {
    fn from_profile(login_token: String, profile: UserProfile) -> Self {
        User {
            username: profile.username,
            name: profile.name,
            created_at: profile.created_at,
            login_token,
            own_stories: profile.stories.into_iter().collect(),
            favorites: profile.favorites.into_iter().collect(),
        }
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.login_token.clone(), self.username.clone())
    }

    pub fn is_favorite(&self, story_id: &StoryId) -> bool {
        self.favorites.contains(story_id)
    }

    pub fn owns(&self, story_id: &StoryId) -> bool {
        self.own_stories.contains(story_id)
    }

    pub async fn login<A: StoryApi + ?Sized>(api: &A, username: &str, password: &str) -> Result<User> {
        let AuthResponse { token, user } = api.login(username, password).await?;
        info!("logged in as {}", user.username);
        Ok(User::from_profile(token, user))
    }

    pub async fn create<A: StoryApi + ?Sized>(
        api: &A,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<User> {
        for (field, value) in [("username", username), ("password", password), ("name", name)] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} is required", field)));
            }
        }

        let AuthResponse { token, user } = api.signup(username, password, name).await?;
        info!("created account {}", user.username);
        Ok(User::from_profile(token, user))
    }

    pub async fn from_credential<A: StoryApi + ?Sized>(api: &A, credential: Credential) -> Result<User> {
        let profile = api.get_user(&credential).await?;
        debug!("resumed session for {}", profile.username);
        Ok(User::from_profile(credential.token, profile))
    }

    /// Rebuilds the user behind a stored token. A missing or rejected token
    /// means "logged out" and yields `None`.
    pub async fn resume<A: StoryApi + ?Sized>(
        api: &A,
        token: Option<&str>,
        username: Option<&str>,
    ) -> Option<User> {
        let (token, username) = match (token, username) {
            (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
                (token, username)
            }
            _ => return None,
        };

        match User::from_credential(api, Credential::new(token, username)).await {
            Ok(user) => Some(user),
            Err(err) => {
                warn!("could not resume session for {}: {}", username, err);
                None
            }
        }
    }

    pub async fn add_favorite<A: StoryApi + ?Sized>(&mut self, api: &A, story_id: &StoryId) -> Result<Story> {
        let story = api.add_favorite(&self.credential(), story_id).await?;
        if !self.favorites.insert(story.clone()) {
            debug!("{} already a favorite of {}", story_id, self.username);
        }
        Ok(story)
    }

    pub async fn delete_favorite<A: StoryApi + ?Sized>(&mut self, api: &A, story_id: &StoryId) -> Result<()> {
        match api.remove_favorite(&self.credential(), story_id).await {
            Ok(()) | Err(Error::Api { status: 404, .. }) => {}
            Err(err) => return Err(err),
        }
        self.favorites.remove(story_id);
        Ok(())
    }

    pub async fn delete_story<A: StoryApi + ?Sized>(&mut self, api: &A, story_id: &StoryId) -> Result<()> {
        if !self.owns(story_id) {
            return Err(Error::Auth(format!(
                "{} is not a story posted by {}",
                story_id, self.username
            )));
        }

        api.delete_story(&self.credential(), story_id).await?;
        self.own_stories.remove(story_id);
        self.favorites.remove(story_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryApi;

    fn api() -> MemoryApi {
        let api = MemoryApi::new();
        api.add_user("alice", "pw", "Alice");
        api.add_user("bob", "pw", "Bob");
        api.seed_story("s1", "First", "http://x.com/1", "bob");
        api.seed_story("s2", "Second", "http://x.com/2", "alice");
        api
    }

    #[tokio::test]
    async fn login_loads_profile_and_stories() {
        let api = api();
        let user = User::login(&api, "alice", "pw").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.name, "Alice");
        assert!(!user.login_token.is_empty());
        assert!(user.owns(&"s2".into()));
        assert!(user.favorites.is_empty());
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_auth_error() {
        let api = api();
        let err = User::login(&api, "alice", "nope").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn create_rejects_taken_username() {
        let api = api();
        let err = User::create(&api, "alice", "pw", "Other Alice").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields_without_a_request() {
        let api = api();
        let err = User::create(&api, "carol", "", "Carol").await.unwrap_err();
        assert_eq!(err, Error::Validation("password is required".into()));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn create_then_login() {
        let api = api();
        let user = User::create(&api, "carol", "secret", "Carol").await.unwrap();
        assert_eq!(user.name, "Carol");
        assert!(user.own_stories.is_empty());

        assert!(User::login(&api, "carol", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn resume_without_credential_is_none() {
        let api = api();
        assert_eq!(User::resume(&api, None, None).await, None);
        assert_eq!(User::resume(&api, Some("tok"), None).await, None);
        assert_eq!(User::resume(&api, Some(""), Some("alice")).await, None);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn resume_with_bad_token_is_none() {
        let api = api();
        assert_eq!(User::resume(&api, Some("forged"), Some("alice")).await, None);
    }

    #[tokio::test]
    async fn resume_with_issued_token() {
        let api = api();
        let user = User::login(&api, "alice", "pw").await.unwrap();
        let resumed = User::resume(&api, Some(&user.login_token), Some("alice"))
            .await
            .unwrap();

        assert_eq!(resumed.username, user.username);
        assert_eq!(resumed.login_token, user.login_token);
    }

    #[tokio::test]
    async fn add_favorite_twice_keeps_one_entry() {
        let api = api();
        let mut user = User::login(&api, "alice", "pw").await.unwrap();
        let s1 = StoryId::new("s1");

        user.add_favorite(&api, &s1).await.unwrap();
        user.add_favorite(&api, &s1).await.unwrap();

        assert_eq!(user.favorites.len(), 1);
        assert!(user.is_favorite(&s1));
    }

    #[tokio::test]
    async fn delete_missing_favorite_is_ok() {
        let api = api();
        let mut user = User::login(&api, "alice", "pw").await.unwrap();
        user.delete_favorite(&api, &"s1".into()).await.unwrap();
        assert!(user.favorites.is_empty());
    }

    #[tokio::test]
    async fn delete_someone_elses_story_is_auth_error() {
        let api = api();
        let mut user = User::login(&api, "alice", "pw").await.unwrap();
        let calls = api.calls();

        let err = user.delete_story(&api, &"s1".into()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(api.calls(), calls);
        assert!(api.story_exists(&"s1".into()));
    }

    #[tokio::test]
    async fn delete_own_story_drops_it_everywhere() {
        let api = api();
        let mut user = User::login(&api, "alice", "pw").await.unwrap();
        let s2 = StoryId::new("s2");
        user.add_favorite(&api, &s2).await.unwrap();

        user.delete_story(&api, &s2).await.unwrap();

        assert!(!user.owns(&s2));
        assert!(!user.is_favorite(&s2));
        assert!(!api.story_exists(&s2));
    }

    #[tokio::test]
    async fn failed_call_leaves_collections_alone() {
        let api = api();
        let mut user = User::login(&api, "alice", "pw").await.unwrap();
        let before = user.clone();

        api.fail_next(Error::Network("offline".into()));
        let err = user.add_favorite(&api, &"s1".into()).await.unwrap_err();

        assert_eq!(err, Error::Network("offline".into()));
        assert_eq!(user, before);
    }
}
