use std::fmt;

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        StoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        StoryId(id.to_owned())
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        StoryId(id)
    }
}

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(rename = "storyId")]
    pub id: StoryId,
    pub title: String,
    pub author: String,
    pub url: String,
    #[serde(rename = "username")]
    pub owner_username: String,
    #[serde(default)]
    pub created_at: String,
}

impl Story {
    pub fn hostname(&self) -> &str {
        hostname(&self.url)
    }
}

/// Fields a user fills in when submitting a story.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewStory {
    pub author: String,
    pub title: String,
    pub url: String,
}

/// Pulls the host out of a url, with or without a scheme, dropping a leading `www.`.
pub fn hostname(url: &str) -> &str {
    let host = if url.contains("://") {
        url.split('/').nth(2).unwrap_or("")
    } else {
        url.split('/').next().unwrap_or("")
    };

    host.strip_prefix("www.").unwrap_or(host)
}

/// Insertion-ordered stories with at most one entry per id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorySet {
    stories: Vec<Story>,
}

impl StorySet {
    pub fn new() -> Self {
        StorySet::default()
    }

    /// Returns false and leaves the set alone when the id is already present.
    pub fn insert(&mut self, story: Story) -> bool {
        if self.contains(&story.id) {
            return false;
        }
        self.stories.push(story);
        true
    }

    pub fn remove(&mut self, id: &StoryId) -> bool {
        let before = self.stories.len();
        self.stories.retain(|story| &story.id != id);
        self.stories.len() != before
    }

    pub fn contains(&self, id: &StoryId) -> bool {
        self.stories.iter().any(|story| &story.id == id)
    }

    pub fn get(&self, id: &StoryId) -> Option<&Story> {
        self.stories.iter().find(|story| &story.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Story> {
        self.stories.iter()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl FromIterator<Story> for StorySet {
    fn from_iter<I: IntoIterator<Item = Story>>(iter: I) -> Self {
        let mut set = StorySet::new();
        for story in iter {
            set.insert(story);
        }
        set
    }
}

impl<'a> IntoIterator for &'a StorySet {
    type Item = &'a Story;
    type IntoIter = std::slice::Iter<'a, Story>;

    fn into_iter(self) -> Self::IntoIter {
        self.stories.iter()
    }
}
