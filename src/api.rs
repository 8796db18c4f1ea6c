//! The remote story service.
//!
//! [`StoryApi`] is the seam between the client state and the network. The
//! browser build talks to the real service through [`HttpApi`]; tests use
//! [`crate::testing::MemoryApi`].

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::session_store::Credential;
use crate::story::{NewStory, Story, StoryId};

/// Profile as the server reports it, stories included.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub favorites: Vec<Story>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// wasm is single threaded and reqwest's wasm futures are not Send
#[async_trait(?Send)]
pub trait StoryApi {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<AuthResponse>;

    async fn get_user(&self, credential: &Credential) -> Result<UserProfile>;

    async fn get_stories(&self) -> Result<Vec<Story>>;

    async fn add_story(&self, credential: &Credential, story: &NewStory) -> Result<Story>;

    async fn add_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<Story>;

    async fn remove_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<()>;

    async fn delete_story(&self, credential: &Credential, story_id: &StoryId) -> Result<()>;
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    username: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct TokenBody<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct AddStoryBody<'a> {
    token: &'a str,
    story: &'a NewStory,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserProfile,
}

#[derive(Deserialize)]
struct StoriesEnvelope {
    stories: Vec<Story>,
}

#[derive(Deserialize)]
struct StoryEnvelope {
    story: Story,
}

#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        HttpApi {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Joins `segments` onto the base URL, percent-encoding each one so a
    /// username or story id cannot change the route.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let invalid =
            |err: String| Error::Network(format!("invalid service url {}: {}", self.base_url, err));
        let mut url =
            reqwest::Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot hold a path".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), error_message(&body)));
        }
        Ok(response)
    }

    async fn read<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }
}

/// The service wraps failures as `{"error": {"message": ...}}`; anything else
/// is passed through as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.to_owned())
}

#[async_trait(?Send)]
impl StoryApi for HttpApi {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        debug!("POST /login as {}", username);
        self.read(
            self.client
                .post(self.url(&["login"])?)
                .json(&LoginBody { username, password }),
        )
        .await
    }

    async fn signup(&self, username: &str, password: &str, name: &str) -> Result<AuthResponse> {
        debug!("POST /signup as {}", username);
        self.read(self.client.post(self.url(&["signup"])?).json(&SignupBody {
            username,
            password,
            name,
        }))
        .await
    }

    async fn get_user(&self, credential: &Credential) -> Result<UserProfile> {
        let envelope: UserEnvelope = self
            .read(
                self.client
                    .get(self.url(&["users", credential.username.as_str()])?)
                    .query(&[("token", credential.token.as_str())]),
            )
            .await?;
        Ok(envelope.user)
    }

    async fn get_stories(&self) -> Result<Vec<Story>> {
        let envelope: StoriesEnvelope = self.read(self.client.get(self.url(&["stories"])?)).await?;
        Ok(envelope.stories)
    }

    async fn add_story(&self, credential: &Credential, story: &NewStory) -> Result<Story> {
        let envelope: StoryEnvelope = self
            .read(self.client.post(self.url(&["stories"])?).json(&AddStoryBody {
                token: &credential.token,
                story,
            }))
            .await?;
        Ok(envelope.story)
    }

    async fn add_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<Story> {
        let url = self.url(&["users", credential.username.as_str(), "favorites", story_id.as_str()])?;
        let envelope: StoryEnvelope = self
            .read(self.client.post(url).json(&TokenBody {
                token: &credential.token,
            }))
            .await?;
        Ok(envelope.story)
    }

    async fn remove_favorite(&self, credential: &Credential, story_id: &StoryId) -> Result<()> {
        let url = self.url(&["users", credential.username.as_str(), "favorites", story_id.as_str()])?;
        self.send(self.client.delete(url).json(&TokenBody {
            token: &credential.token,
        }))
        .await?;
        Ok(())
    }

    async fn delete_story(&self, credential: &Credential, story_id: &StoryId) -> Result<()> {
        let url = self.url(&["stories", story_id.as_str()])?;
        self.send(self.client.delete(url).json(&TokenBody {
            token: &credential.token,
        }))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_service_envelope() {
        let body = r#"{"error": {"status": 401, "title": "Unauthorized", "message": "Invalid password"}}"#;
        assert_eq!(error_message(body), "Invalid password");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn auth_response_reads_profile_and_stories() {
        let body = r#"{
            "token": "abc",
            "user": {
                "username": "alice",
                "name": "Alice",
                "createdAt": "2020-01-01",
                "stories": [{
                    "storyId": "s1", "title": "T", "author": "alice",
                    "url": "http://x.com/y", "username": "alice", "createdAt": "2020-01-02"
                }],
                "favorites": []
            }
        }"#;
        let response: AuthResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.token, "abc");
        assert_eq!(response.user.name, "Alice");
        assert_eq!(response.user.stories.len(), 1);
        assert!(response.user.favorites.is_empty());
    }

    #[test]
    fn profile_without_story_lists() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"username": "bob", "name": "Bob"}"#).unwrap();
        assert!(profile.stories.is_empty());
        assert_eq!(profile.created_at, "");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = HttpApi::new("http://localhost:5000/");
        assert_eq!(api.url(&["stories"]).unwrap().as_str(), "http://localhost:5000/stories");

        let mounted = HttpApi::new("http://localhost:5000/v3");
        assert_eq!(
            mounted.url(&["stories", "s1"]).unwrap().as_str(),
            "http://localhost:5000/v3/stories/s1"
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        let api = HttpApi::new("http://localhost:5000");
        let url = api.url(&["users", "a/b?c#d", "favorites", "s 1"]).unwrap();

        assert_eq!(url.path(), "/users/a%2Fb%3Fc%23d/favorites/s%201");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unusable_base_url_is_an_error() {
        let api = HttpApi::new("not a url");
        assert!(matches!(api.url(&["stories"]), Err(Error::Network(_))));
    }

    #[test]
    fn add_story_body_shape() {
        let story = NewStory {
            author: "alice".into(),
            title: "T".into(),
            url: "http://x.com/y".into(),
        };
        let body = serde_json::to_value(AddStoryBody {
            token: "tok",
            story: &story,
        })
        .unwrap();

        assert_eq!(body["token"], "tok");
        assert_eq!(body["story"]["url"], "http://x.com/y");
    }
}
