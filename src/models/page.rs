//! Paging and sorting parameters

/// Query for paged list endpoints. Unset fields are left to server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn new(page_num: Option<u32>, page_size: Option<u32>, sort: Option<String>) -> Self {
        Self {
            page_num,
            page_size,
            sort,
        }
    }
}
