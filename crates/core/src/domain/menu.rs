//! View state for the page header: brand, account button and its dropdown menu.

pub const BRAND: &str = "SS4R";

/// Where a click landed relative to the account navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    InsideNav,
    Outside,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    visible: bool,
}

impl MenuState {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn is_visible(self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn toggled(mut self) -> Self {
        self.toggle();
        self
    }

    /// Clicking anywhere outside the navigation closes an open menu.
    pub fn on_click(&mut self, target: ClickTarget) {
        if self.visible && target == ClickTarget::Outside {
            self.toggle();
        }
    }

    pub fn after_click(mut self, target: ClickTarget) -> Self {
        self.on_click(target);
        self
    }

    /// Picking an entry runs it and folds the menu back up.
    pub fn select(&mut self, _item: MenuItem) {
        if self.visible {
            self.toggle();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    SyncNew,
    SyncAll,
    Logout,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::SyncNew, MenuItem::SyncAll, MenuItem::Logout];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::SyncNew => "Sync new posts",
            MenuItem::SyncAll => "Resync everything",
            MenuItem::Logout => "Log out",
        }
    }

    pub fn action_path(self) -> &'static str {
        match self {
            MenuItem::SyncNew => "/sync/new",
            MenuItem::SyncAll => "/sync/all",
            MenuItem::Logout => "/logout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub username: Option<String>,
    pub menu: MenuState,
}

impl Header {
    pub fn new(username: Option<String>, menu: MenuState) -> Self {
        Self { username, menu }
    }

    pub fn brand(&self) -> &'static str {
        BRAND
    }

    pub fn user_label(&self) -> Option<String> {
        self.username.as_ref().map(|name| format!("u/{name}"))
    }
}
