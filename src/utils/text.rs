/// 按字符（而非字节）截断，保证不会切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 状态行里展示的查询，超过50个字符时截断为47个字符加省略号
pub fn shorten_for_status(query: &str) -> String {
    const LIMIT: usize = 50;
    const KEEP: usize = 47;

    if query.chars().count() > LIMIT {
        format!("{}...", truncate_chars(query, KEEP))
    } else {
        query.to_string()
    }
}

/// 生成适合作为文件名的标识
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "research".to_string()
    } else {
        truncate_chars(&slug, 60).trim_end_matches('-').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("英伟达财报分析", 3), "英伟达");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_shorten_for_status() {
        let exact = "a".repeat(50);
        assert_eq!(shorten_for_status(&exact), exact);

        let long = "b".repeat(51);
        let shortened = shorten_for_status(&long);
        assert_eq!(shortened, format!("{}...", "b".repeat(47)));
        assert_eq!(shortened.chars().count(), 50);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("NVDA"), "nvda");
        assert_eq!(
            slugify("  What is the future of quantum computing?  "),
            "what-is-the-future-of-quantum-computing"
        );
        assert_eq!(slugify("!!!"), "research");
    }
}
