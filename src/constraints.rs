use crate::size_limit::SizeLimit;

/// Represents some rules to be applied on the body to prevent abuse.
///
/// # Examples
///
/// ```
/// use form_params::{Constraints, FormParser, SizeLimit};
///
/// let constraints = Constraints::new()
///     .allowed_fields(vec!["title", "upload"])
///     .size_limit(
///         SizeLimit::new()
///             .whole_stream(15 * 1024 * 1024)
///             .per_field(10 * 1024 * 1024)
///             .for_field("title", 100),
///     );
///
/// let parser = FormParser::new().constraints(constraints);
/// # drop(parser);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) allowed_fields: Option<Vec<String>>,
}

impl Constraints {
    /// Creates a set of rules with default behaviour.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies rules on the size of the body and of each field.
    pub fn size_limit(mut self, size_limit: SizeLimit) -> Constraints {
        self.size_limit = size_limit;
        self
    }

    /// Specify which fields are allowed. A multipart part with any other name
    /// fails the parse with [`Error::UnknownField`](crate::Error::UnknownField).
    pub fn allowed_fields<N: Into<String>>(mut self, allowed_fields: Vec<N>) -> Constraints {
        let allowed_fields = allowed_fields.into_iter().map(|item| item.into()).collect();
        self.allowed_fields = Some(allowed_fields);
        self
    }

    pub(crate) fn is_it_allowed(&self, field: Option<&str>) -> bool {
        match &self.allowed_fields {
            Some(allowed_fields) => field
                .map(|field| allowed_fields.iter().any(|item| item == field))
                .unwrap_or(false),
            None => true,
        }
    }
}
