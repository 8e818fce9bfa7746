use micro_mvc::{RouteError, Router};

/// A named route table the router benchmarks run against.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    table: RouteTable,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, table: RouteTable) -> Self {
        Self { name, group, table }
    }

    pub fn small(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Small, table)
    }

    pub fn normal(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Normal, table)
    }

    pub fn large(name: &'static str, table: RouteTable) -> Self {
        Self::new(name, TestGroup::Large, table)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

/// Generated routes of the shape `/resource{n}/{id}/items/{item}`.
#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    resources: usize,
}

impl RouteTable {
    pub const fn new(resources: usize) -> Self {
        Self { resources }
    }

    pub fn len(&self) -> usize {
        self.resources * 2
    }

    pub fn is_empty(&self) -> bool {
        self.resources == 0
    }

    /// Builds the router, each resource gets a collection route and an item route.
    ///
    /// # Errors
    /// Never fails for the generated patterns, the error comes from route compilation.
    pub fn router(&self) -> Result<Router, RouteError> {
        let mut router = Router::new();
        for n in 0..self.resources {
            router.get(&format!("/resource{n}/{{id}}"), format!("Resource{n}Controller"), None)?;
            router.get(&format!("/resource{n}/{{id}}/items/{{item}}"), format!("Resource{n}Controller"), Some("item"))?;
        }
        Ok(router)
    }

    /// A path served by the first registered route, the worst case for reverse-order lookup.
    pub fn first_path(&self) -> String {
        "/resource0/42".to_string()
    }

    /// A path served by the last registered route.
    pub fn last_path(&self) -> String {
        format!("/resource{}/42/items/7", self.resources.saturating_sub(1))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    pub fn name(&self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Normal => "normal",
            TestGroup::Large => "large",
        }
    }

    /// Large tables take long per iteration, they get fewer samples.
    pub fn sample_size(&self) -> usize {
        match self {
            TestGroup::Small | TestGroup::Normal => 100,
            TestGroup::Large => 50,
        }
    }
}
