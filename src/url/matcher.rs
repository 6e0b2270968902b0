/// Checks whether an absolute link belongs to a job's site
///
/// The check is a literal prefix match on the job's base URL, which keeps a
/// crawl of `https://example.com/docs` inside `/docs`.
pub fn is_within_base(link: &str, base_url: &str) -> bool {
    link.starts_with(base_url)
}

/// Keeps only the links that belong to the job's site, preserving order
pub fn filter_within_base<'a, I>(links: I, base_url: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    links
        .into_iter()
        .filter(|link| is_within_base(link, base_url))
        .cloned()
        .collect()
}
