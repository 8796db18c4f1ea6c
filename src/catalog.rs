use log::debug;

use crate::api::StoryApi;
use crate::error::{Error, Result};
use crate::story::{NewStory, Story, StoryId};
use crate::user::User;

/// The global feed, most recent first. Replaced wholesale on every fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    stories: Vec<Story>,
}

impl Catalog {
    pub fn new(stories: Vec<Story>) -> Self {
        Catalog { stories }
    }

    pub async fn fetch_all<A: StoryApi + ?Sized>(api: &A) -> Result<Catalog> {
        let stories = api.get_stories().await?;
        debug!("fetched {} stories", stories.len());
        Ok(Catalog { stories })
    }

    /// Posts a story as `user`. Adding it to `user.own_stories` is left to the caller.
    pub async fn submit<A: StoryApi + ?Sized>(
        api: &A,
        user: Option<&User>,
        story: &NewStory,
    ) -> Result<Story> {
        let user = user.ok_or_else(Error::not_logged_in)?;
        api.add_story(&user.credential(), story).await
    }

    pub fn remove(&mut self, story_id: &StoryId) -> bool {
        let before = self.stories.len();
        self.stories.retain(|story| &story.id != story_id);
        self.stories.len() != before
    }

    /// Puts a story at the head of the feed unless it is already there.
    pub fn push_newest(&mut self, story: Story) {
        if !self.contains(&story.id) {
            self.stories.insert(0, story);
        }
    }

    pub fn contains(&self, story_id: &StoryId) -> bool {
        self.stories.iter().any(|story| &story.id == story_id)
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryApi;

    fn new_story(title: &str) -> NewStory {
        NewStory {
            author: "alice".into(),
            title: title.into(),
            url: "http://x.com/y".into(),
        }
    }

    #[tokio::test]
    async fn fetch_replaces_instead_of_merging() {
        let api = MemoryApi::new();
        api.seed_story("a", "A", "http://a.com", "bob");
        let first = Catalog::fetch_all(&api).await.unwrap();
        assert_eq!(first.len(), 1);

        api.seed_story("b", "B", "http://b.com", "bob");
        let second = Catalog::fetch_all(&api).await.unwrap();
        let ids: Vec<&str> = second.stories().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn fetch_needs_no_login() {
        let api = MemoryApi::new();
        assert!(Catalog::fetch_all(&api).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_when_logged_out_is_auth_error() {
        let api = MemoryApi::new();
        let err = Catalog::submit(&api, None, &new_story("T")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn submit_returns_story_owned_by_user() {
        let api = MemoryApi::new();
        api.add_user("alice", "pw", "Alice");
        let user = User::login(&api, "alice", "pw").await.unwrap();

        let story = Catalog::submit(&api, Some(&user), &new_story("T")).await.unwrap();
        assert_eq!(story.owner_username, "alice");
        assert_eq!(story.hostname(), "x.com");
        // the catalog does not touch the user
        assert!(user.own_stories.is_empty());
    }

    #[test]
    fn remove_reports_whether_present() {
        let mut catalog = Catalog::new(Vec::new());
        assert!(!catalog.remove(&"gone".into()));
    }
}
