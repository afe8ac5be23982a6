//! Page/size parameter resolution.

use crate::error::ValidationError;

/// A resolved page request; `offset` is computed from the clamped size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationResolver {
    default_size: u32,
    max_size: u32,
}

impl PaginationResolver {
    pub fn new(default_size: u32, max_size: u32) -> Self {
        Self { default_size, max_size }
    }

    /// Resolve raw `page`/`size` query strings.
    ///
    /// Absent parameters take defaults; non-numeric or non-positive values
    /// are rejected. An oversized `size` is not an error: it is clamped
    /// to the configured maximum.
    pub fn resolve(
        &self,
        page: Option<&str>,
        size: Option<&str>,
    ) -> Result<PageRequest, ValidationError> {
        let page = match page {
            None => 1,
            Some(raw) => parse_positive(raw).ok_or(ValidationError::InvalidPage)?,
        };

        let mut size = match size {
            None => self.default_size,
            Some(raw) => parse_positive(raw).ok_or(ValidationError::InvalidSize)?,
        };
        if size > self.max_size {
            size = self.max_size;
        }

        Ok(PageRequest {
            page,
            size,
            offset: (page as usize - 1) * size as usize,
        })
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value >= 1 => u32::try_from(value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PaginationResolver {
        PaginationResolver::new(50, 500)
    }

    #[test]
    fn absent_parameters_take_defaults() {
        let req = resolver().resolve(None, None).unwrap();
        assert_eq!(req, PageRequest { page: 1, size: 50, offset: 0 });
    }

    #[test]
    fn computes_offset_from_page_and_size() {
        let req = resolver().resolve(Some("3"), Some("25")).unwrap();
        assert_eq!(req.page, 3);
        assert_eq!(req.size, 25);
        assert_eq!(req.offset, 50);
    }

    #[test]
    fn rejects_non_positive_page() {
        assert_eq!(
            resolver().resolve(Some("0"), None).unwrap_err(),
            ValidationError::InvalidPage
        );
        assert_eq!(
            resolver().resolve(Some("-2"), None).unwrap_err(),
            ValidationError::InvalidPage
        );
    }

    #[test]
    fn rejects_non_numeric_parameters() {
        assert_eq!(
            resolver().resolve(Some("abc"), None).unwrap_err(),
            ValidationError::InvalidPage
        );
        assert_eq!(
            resolver().resolve(None, Some("ten")).unwrap_err(),
            ValidationError::InvalidSize
        );
    }

    #[test]
    fn rejects_non_positive_size_but_clamps_oversized() {
        assert_eq!(
            resolver().resolve(None, Some("0")).unwrap_err(),
            ValidationError::InvalidSize
        );

        // Oversized is never an error, only clamped.
        let req = resolver().resolve(None, Some("9999")).unwrap();
        assert_eq!(req.size, 500);
    }

    #[test]
    fn offset_uses_the_clamped_size() {
        let req = resolver().resolve(Some("2"), Some("9999")).unwrap();
        assert_eq!(req.size, 500);
        assert_eq!(req.offset, 500);
    }
}
