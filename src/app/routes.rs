/// Pages of the admin client, addressed by path like the web admin they mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    ProductImport,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::Home, Route::ProductImport];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::ProductImport => "/admin/product-import",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::ProductImport => "Product import",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }
}

#[derive(Debug, Default)]
pub struct Router {
    current: Route,
    history: Vec<Route>,
}

impl Router {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, route: Route) {
        if route == self.current {
            return;
        }
        log::debug!("Navigating {} -> {}", self.current.path(), route.path());
        self.history.push(self.current);
        self.current = route;
    }

    /// Unknown paths land on the home page.
    pub fn navigate_path(&mut self, path: &str) {
        match Route::from_path(path) {
            Some(route) => self.navigate(route),
            None => {
                log::warn!("No page at {path}");
                self.navigate(Route::Home);
            }
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn back(&mut self) {
        if let Some(previous) = self.history.pop() {
            self.current = previous;
        }
    }
}
