#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Category {
    pub name: String,
    pub icon: String,
    pub topics: u64,
    pub posts: u64,
}

impl Category {
    fn new(name: &str, icon: &str, topics: u64, posts: u64) -> Category {
        Category {
            name: String::from(name),
            icon: String::from(icon),
            topics,
            posts,
        }
    }

    /// The fixed category table shown on the community landing page
    pub fn defaults() -> Vec<Category> {
        vec![
            Category::new("Housing & Tenant Issues", "fa-home", 523, 2100),
            Category::new("Family Law", "fa-user-friends", 412, 1800),
            Category::new("Employment Law", "fa-briefcase", 385, 1500),
            Category::new("Small Claims", "fa-gavel", 247, 982),
        ]
    }
}
