use story_feed::view::Sections;
use story_feed::{Dirty, ListView, PageView, StoryView};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlFormElement, HtmlInputElement};

/// Handles to the page's fixed elements, looked up once at startup.
pub struct Page {
    document: Document,
    body: Element,
    all_stories: Element,
    submit_form: HtmlFormElement,
    favorites: Element,
    own_stories: Element,
    login_form: HtmlFormElement,
    create_account_form: HtmlFormElement,
    nav_login: Element,
    nav_logout: Element,
    nav_welcome: Element,
    main_nav_links: Element,
    user_profile: Element,
    profile_name: Element,
    profile_username: Element,
    profile_account_date: Element,
    notice: Option<Element>,
}

fn missing(what: &str) -> JsValue {
    JsValue::from_str(&format!("page is missing {}", what))
}

fn select(document: &Document, selector: &str) -> Result<Element, JsValue> {
    document
        .query_selector(selector)?
        .ok_or_else(|| missing(selector))
}

fn form(document: &Document, selector: &str) -> Result<HtmlFormElement, JsValue> {
    select(document, selector)?
        .dyn_into::<HtmlFormElement>()
        .map_err(|_| JsValue::from_str(&format!("{} is not a form", selector)))
}

fn set_visible(element: &Element, visible: bool) -> Result<(), JsValue> {
    if visible {
        element.remove_attribute("hidden")
    } else {
        element.set_attribute("hidden", "")
    }
}

impl Page {
    pub fn locate(document: Document) -> Result<Page, JsValue> {
        Ok(Page {
            body: select(&document, "body")?,
            all_stories: select(&document, "#all-articles-list")?,
            submit_form: form(&document, "#submit-form")?,
            favorites: select(&document, "#favorited-articles")?,
            own_stories: select(&document, "#my-articles")?,
            login_form: form(&document, "#login-form")?,
            create_account_form: form(&document, "#create-account-form")?,
            nav_login: select(&document, "#nav-login")?,
            nav_logout: select(&document, "#nav-logout")?,
            nav_welcome: select(&document, "#nav-welcome")?,
            main_nav_links: select(&document, ".main-nav-links")?,
            user_profile: select(&document, "#user-profile")?,
            profile_name: select(&document, "#profile-name span")?,
            profile_username: select(&document, "#profile-username span")?,
            profile_account_date: select(&document, "#profile-account-date span")?,
            notice: document.query_selector("#notice")?,
            document,
        })
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn login_form(&self) -> &HtmlFormElement {
        &self.login_form
    }

    pub fn create_account_form(&self) -> &HtmlFormElement {
        &self.create_account_form
    }

    pub fn submit_form(&self) -> &HtmlFormElement {
        &self.submit_form
    }

    pub fn input_value(&self, id: &str) -> Result<String, JsValue> {
        let input = self
            .document
            .get_element_by_id(id)
            .ok_or_else(|| missing(id))?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| JsValue::from_str(&format!("{} is not an input", id)))?;
        Ok(input.value())
    }

    pub fn set_busy(&self, busy: bool) -> Result<(), JsValue> {
        self.body
            .set_attribute("aria-busy", if busy { "true" } else { "false" })
    }

    /// Redraws what `dirty` names. The notice is always redrawn.
    pub fn render(&self, view: &PageView, dirty: Dirty) -> Result<(), JsValue> {
        if dirty.feed {
            self.render_stories(&self.all_stories, &view.feed)?;
        }
        if dirty.own_stories {
            self.render_list(&self.own_stories, &view.own_stories)?;
        }
        if dirty.favorites {
            self.render_list(&self.favorites, &view.favorites)?;
        }
        if dirty.profile {
            self.render_profile(view)?;
        }
        if dirty.nav {
            self.render_nav(view)?;
        }
        if dirty.panel {
            self.render_sections(view.panel.sections())?;
        }
        if dirty.reset_forms {
            self.login_form.reset();
            self.create_account_form.reset();
            self.submit_form.reset();
        }
        self.render_notice(view.notice.as_deref())
    }

    pub fn render_notice(&self, notice: Option<&str>) -> Result<(), JsValue> {
        if let Some(element) = &self.notice {
            element.set_text_content(notice);
            set_visible(element, notice.is_some())?;
        }
        Ok(())
    }

    fn render_stories(&self, list: &Element, stories: &[StoryView]) -> Result<(), JsValue> {
        list.set_inner_html("");
        for story in stories {
            let item = self.story_item(story)?;
            list.append_child(&item)?;
        }
        Ok(())
    }

    fn render_list(&self, list: &Element, view: &ListView) -> Result<(), JsValue> {
        match view {
            ListView::Stories(stories) => self.render_stories(list, stories),
            ListView::Empty(placeholder) => {
                list.set_inner_html("");
                let heading = self.document.create_element("h5")?;
                heading.set_text_content(Some(*placeholder));
                list.append_child(&heading)?;
                Ok(())
            }
        }
    }

    fn element(&self, tag: &str, class: &str) -> Result<Element, JsValue> {
        let element = self.document.create_element(tag)?;
        element.set_class_name(class);
        Ok(element)
    }

    fn story_item(&self, story: &StoryView) -> Result<Element, JsValue> {
        let item = self.document.create_element("li")?;
        item.set_id(story.id.as_str());

        if story.deletable {
            let trash = self.element("span", "trash-can")?;
            let trash_icon = self.element("i", "fas fa-trash-alt")?;
            trash.append_child(&trash_icon)?;
            item.append_child(&trash)?;
        }

        let star = self.element("span", "star")?;
        let icon = if story.favorited { "fas fa-star" } else { "far fa-star" };
        let star_icon = self.element("i", icon)?;
        star.append_child(&star_icon)?;
        item.append_child(&star)?;

        let link = self.element("a", "article-link")?;
        link.set_attribute("href", &story.url)?;
        link.set_attribute("target", "a_blank")?;
        let title = self.document.create_element("strong")?;
        title.set_text_content(Some(&story.title));
        link.append_child(&title)?;
        item.append_child(&link)?;

        let author = self.element("small", "article-author")?;
        author.set_text_content(Some(&format!("by {}", story.author)));
        item.append_child(&author)?;

        let hostname = self.element("small", "article-hostname")?;
        hostname.set_text_content(Some(&format!("({})", story.hostname)));
        item.append_child(&hostname)?;

        let username = self.element("small", "article-username")?;
        username.set_text_content(Some(&format!("posted by {}", story.username)));
        item.append_child(&username)?;

        Ok(item)
    }

    fn render_profile(&self, view: &PageView) -> Result<(), JsValue> {
        let profile = view.profile.as_ref();
        self.profile_name
            .set_text_content(profile.map(|p| p.name.as_str()));
        self.profile_username
            .set_text_content(profile.map(|p| p.username.as_str()));
        self.profile_account_date
            .set_text_content(profile.map(|p| p.created_at.as_str()));
        Ok(())
    }

    fn render_nav(&self, view: &PageView) -> Result<(), JsValue> {
        let nav = &view.nav;
        if let Some(link) = self.nav_welcome.query_selector("a")? {
            link.set_text_content(nav.welcome.as_deref());
        }
        set_visible(&self.nav_welcome, nav.welcome.is_some())?;
        set_visible(&self.nav_login, nav.show_login)?;
        set_visible(&self.nav_logout, nav.show_logout)?;
        set_visible(&self.main_nav_links, nav.show_user_links)
    }

    fn render_sections(&self, sections: Sections) -> Result<(), JsValue> {
        set_visible(&self.all_stories, sections.feed)?;
        set_visible(&self.submit_form, sections.submit_form)?;
        set_visible(&self.favorites, sections.favorites)?;
        set_visible(&self.own_stories, sections.own_stories)?;
        set_visible(&self.user_profile, sections.profile)?;
        set_visible(&self.login_form, sections.auth_forms)?;
        set_visible(&self.create_account_form, sections.auth_forms)
    }
}
