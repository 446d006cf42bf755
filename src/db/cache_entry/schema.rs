pub const TABLE_NAME: &str = "cache_entry";

pub enum Columns {
    Key,
    Value,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Key => "key",
            Columns::Value => "value",
            Columns::UpdatedAt => "updated_at",
        }
    }
}
