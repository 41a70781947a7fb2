//! URL templates in the style of RFC 6570.
//!
//! Two expression forms are supported:
//!
//! - `{var}` / `{a,b}`: required simple expansion, values percent-encoded
//!   and joined with `,`
//! - `{?a,b}`: optional form-style query expansion; absent variables are
//!   skipped, and the expression vanishes entirely if none is present

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::app::{MontageError, Result};
use crate::domain::Parameters;

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Expands `template` with `parameters` into a URL.
pub fn expand(template: &str, parameters: &Parameters) -> Result<String> {
    let mut url = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        url.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            MontageError::Config(format!("unterminated expression in template {template}"))
        })?;
        expand_expression(&after[..close], template, parameters, &mut url)?;
        rest = &after[close + 1..];
    }
    url.push_str(rest);

    url::Url::parse(&url)?;
    Ok(url)
}

fn expand_expression(
    expression: &str,
    template: &str,
    parameters: &Parameters,
    out: &mut String,
) -> Result<()> {
    if let Some(names) = expression.strip_prefix('?') {
        let mut separator = if out.contains('?') { '&' } else { '?' };
        for name in variables(names) {
            if let Some(value) = parameters.get_str(name) {
                out.push(separator);
                out.push_str(name);
                out.push('=');
                out.extend(utf8_percent_encode(&value, UNRESERVED));
                separator = '&';
            }
        }
        return Ok(());
    }

    let mut values = Vec::new();
    for name in variables(expression) {
        let value = parameters
            .get_str(name)
            .ok_or_else(|| MontageError::MissingTemplateVariable {
                variable: name.to_string(),
                template: template.to_string(),
            })?;
        values.push(utf8_percent_encode(&value, UNRESERVED).to_string());
    }
    out.push_str(&values.join(","));
    Ok(())
}

fn variables(names: &str) -> impl Iterator<Item = &str> {
    names.split(',').map(str::trim).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_simple_variables() {
        let params = Parameters::from([("id", "42"), ("lang", "de")]);
        let url = expand("http://example.com/{lang}/product/{id}", &params).unwrap();
        assert_eq!(url, "http://example.com/de/product/42");
    }

    #[test]
    fn test_percent_encodes_values() {
        let params = Parameters::from([("q", "hello world/ä")]);
        let url = expand("http://example.com/search/{q}", &params).unwrap();
        assert_eq!(url, "http://example.com/search/hello%20world%2F%C3%A4");
    }

    #[test]
    fn test_missing_required_variable_fails() {
        let result = expand("http://example.com/{id}", &Parameters::empty());
        match result {
            Err(MontageError::MissingTemplateVariable { variable, .. }) => {
                assert_eq!(variable, "id")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_query_expansion_skips_absent_variables() {
        let params = Parameters::from([("page", "2")]);
        let url = expand("http://example.com/list{?page,size}", &params).unwrap();
        assert_eq!(url, "http://example.com/list?page=2");

        let url = expand("http://example.com/list{?page,size}", &Parameters::empty()).unwrap();
        assert_eq!(url, "http://example.com/list");
    }

    #[test]
    fn test_query_expansion_appends_to_existing_query() {
        let params = Parameters::from([("size", "10")]);
        let url = expand("http://example.com/list?sort=asc{?size}", &params).unwrap();
        assert_eq!(url, "http://example.com/list?sort=asc&size=10");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let params = Parameters::from([("path", "x")]);
        assert!(matches!(
            expand("not a url/{path}", &params),
            Err(MontageError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_unterminated_expression() {
        assert!(matches!(
            expand("http://example.com/{id", &Parameters::empty()),
            Err(MontageError::Config(_))
        ));
    }
}
