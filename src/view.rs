//! Pure mapping from client state to what the page shows.
//!
//! Nothing here touches the DOM. The frontend walks a [`PageView`] and
//! replaces each list wholesale.

use crate::catalog::Catalog;
use crate::dispatcher::AppState;
use crate::story::{Story, StoryId};
use crate::user::User;

pub const NO_OWN_STORIES: &'static str = "No stories added by user yet!";
pub const NO_FAVORITES: &'static str = "No favorites added!";

#[derive(Hash, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Panel {
    #[default]
    AllStories,
    /// The submit form, shown above the feed.
    SubmitStory,
    Favorites,
    OwnStories,
    Profile,
    /// Login and create-account forms.
    Auth,
}

/// Which page sections are visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sections {
    pub feed: bool,
    pub submit_form: bool,
    pub favorites: bool,
    pub own_stories: bool,
    pub profile: bool,
    pub auth_forms: bool,
}

impl Panel {
    pub fn needs_user(self) -> bool {
        matches!(
            self,
            Panel::SubmitStory | Panel::Favorites | Panel::OwnStories | Panel::Profile
        )
    }

    pub fn sections(self) -> Sections {
        let mut sections = Sections::default();
        match self {
            Panel::AllStories => sections.feed = true,
            Panel::SubmitStory => {
                sections.submit_form = true;
                sections.feed = true;
            }
            Panel::Favorites => sections.favorites = true,
            Panel::OwnStories => sections.own_stories = true,
            Panel::Profile => sections.profile = true,
            Panel::Auth => sections.auth_forms = true,
        }
        sections
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoryView {
    pub id: StoryId,
    pub title: String,
    pub url: String,
    pub author: String,
    pub hostname: String,
    pub username: String,
    pub favorited: bool,
    pub deletable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListView {
    Stories(Vec<StoryView>),
    /// A single placeholder line standing in for an empty list.
    Empty(&'static str),
}

impl ListView {
    pub fn stories(&self) -> &[StoryView] {
        match self {
            ListView::Stories(stories) => stories,
            ListView::Empty(_) => &[],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavView {
    pub welcome: Option<String>,
    pub show_login: bool,
    pub show_logout: bool,
    pub show_user_links: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub username: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageView {
    pub panel: Panel,
    pub nav: NavView,
    pub feed: Vec<StoryView>,
    pub own_stories: ListView,
    pub favorites: ListView,
    pub profile: Option<ProfileView>,
    pub notice: Option<String>,
}

pub fn story_view(story: &Story, user: Option<&User>, deletable: bool) -> StoryView {
    StoryView {
        id: story.id.clone(),
        title: story.title.clone(),
        url: story.url.clone(),
        author: story.author.clone(),
        hostname: story.hostname().to_owned(),
        username: story.owner_username.clone(),
        favorited: user.map_or(false, |user| user.is_favorite(&story.id)),
        deletable,
    }
}

pub fn feed(user: Option<&User>, catalog: &Catalog) -> Vec<StoryView> {
    catalog
        .stories()
        .iter()
        .map(|story| story_view(story, user, false))
        .collect()
}

pub fn own_stories(user: Option<&User>) -> ListView {
    match user {
        None => ListView::Stories(Vec::new()),
        Some(user) if user.own_stories.is_empty() => ListView::Empty(NO_OWN_STORIES),
        Some(user) => ListView::Stories(
            user.own_stories
                .iter()
                .map(|story| story_view(story, Some(user), true))
                .collect(),
        ),
    }
}

pub fn favorites(user: Option<&User>) -> ListView {
    match user {
        None => ListView::Stories(Vec::new()),
        Some(user) if user.favorites.is_empty() => ListView::Empty(NO_FAVORITES),
        Some(user) => ListView::Stories(
            user.favorites
                .iter()
                .map(|story| story_view(story, Some(user), false))
                .collect(),
        ),
    }
}

pub fn nav(user: Option<&User>) -> NavView {
    match user {
        Some(user) => NavView {
            welcome: Some(user.username.clone()),
            show_login: false,
            show_logout: true,
            show_user_links: true,
        },
        None => NavView {
            welcome: None,
            show_login: true,
            show_logout: false,
            show_user_links: false,
        },
    }
}

pub fn profile(user: Option<&User>) -> Option<ProfileView> {
    user.map(|user| ProfileView {
        name: user.name.clone(),
        username: user.username.clone(),
        created_at: user.created_at.clone(),
    })
}

pub fn page(state: &AppState) -> PageView {
    let user = state.user.as_ref();
    PageView {
        panel: state.panel,
        nav: nav(user),
        feed: feed(user, &state.catalog),
        own_stories: own_stories(user),
        favorites: favorites(user),
        profile: profile(user),
        notice: state.notice.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str, owner: &str) -> Story {
        Story {
            id: id.into(),
            title: format!("Story {}", id),
            author: owner.into(),
            url: format!("https://www.{}.com/post", id),
            owner_username: owner.into(),
            created_at: String::new(),
        }
    }

    fn alice(own: Vec<Story>, favorites: Vec<Story>) -> User {
        User {
            username: "alice".into(),
            name: "Alice".into(),
            created_at: "2020-01-01".into(),
            login_token: "tok".into(),
            own_stories: own.into_iter().collect(),
            favorites: favorites.into_iter().collect(),
        }
    }

    #[test]
    fn logged_out_feed_has_no_filled_stars() {
        let catalog = Catalog::new(vec![story("a", "bob"), story("b", "alice")]);
        let feed = feed(None, &catalog);

        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|view| !view.favorited && !view.deletable));
    }

    #[test]
    fn stars_follow_favorite_membership() {
        let catalog = Catalog::new(vec![story("a", "bob"), story("b", "bob")]);
        let user = alice(Vec::new(), vec![story("b", "bob")]);
        let feed = feed(Some(&user), &catalog);

        assert_eq!(feed[0].id, StoryId::new("a"));
        assert!(!feed[0].favorited);
        assert!(feed[1].favorited);
        assert_eq!(feed[1].hostname, "b.com");
    }

    #[test]
    fn own_stories_are_deletable() {
        let user = alice(vec![story("a", "alice")], Vec::new());
        let own = own_stories(Some(&user));

        assert_eq!(own.stories().len(), 1);
        assert!(own.stories()[0].deletable);
    }

    #[test]
    fn empty_lists_render_placeholders() {
        let user = alice(Vec::new(), Vec::new());
        assert_eq!(own_stories(Some(&user)), ListView::Empty(NO_OWN_STORIES));
        assert_eq!(favorites(Some(&user)), ListView::Empty(NO_FAVORITES));

        let user = alice(Vec::new(), vec![story("a", "bob")]);
        assert_eq!(favorites(Some(&user)).stories().len(), 1);
    }

    #[test]
    fn logged_out_lists_render_nothing() {
        assert_eq!(own_stories(None), ListView::Stories(Vec::new()));
        assert_eq!(favorites(None).stories().len(), 0);
        assert_eq!(profile(None), None);
    }

    #[test]
    fn nav_switches_with_login() {
        let logged_out = nav(None);
        assert!(logged_out.show_login && !logged_out.show_logout);

        let user = alice(Vec::new(), Vec::new());
        let logged_in = nav(Some(&user));
        assert_eq!(logged_in.welcome.as_deref(), Some("alice"));
        assert!(logged_in.show_logout && logged_in.show_user_links);
    }

    #[test]
    fn submit_panel_keeps_feed_visible() {
        let sections = Panel::SubmitStory.sections();
        assert!(sections.submit_form && sections.feed);
        assert!(!Panel::Favorites.sections().feed);
        assert!(!Panel::AllStories.needs_user());
        assert!(Panel::Profile.needs_user());
    }

    #[test]
    fn page_carries_panel_and_notice() {
        let state = AppState {
            user: Some(alice(Vec::new(), Vec::new())),
            catalog: Catalog::default(),
            panel: Panel::Profile,
            notice: Some("offline".into()),
        };
        let page = page(&state);

        assert_eq!(page.panel, Panel::Profile);
        assert_eq!(page.profile.unwrap().name, "Alice");
        assert_eq!(page.notice.as_deref(), Some("offline"));
        assert_eq!(page.own_stories, ListView::Empty(NO_OWN_STORIES));
    }
}
