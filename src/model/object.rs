use std::fmt;

use crate::model::error::BackendError;

/// One page of a paginated listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub continuation_token: Option<String>,
}

/// Body of a downloaded object, yielded chunk by chunk.
pub type ObjectBody = Box<dyn Iterator<Item = Result<Vec<u8>, BackendError>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Copy,
    Delete,
    Get,
    Put,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list_objects",
            Operation::Copy => "copy_object",
            Operation::Delete => "delete_object",
            Operation::Get => "get_object",
            Operation::Put => "put_object",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
