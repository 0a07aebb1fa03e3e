/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// 公告附件仅接受 PDF，扩展名参数保留以便将来放开更多类型。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        ".pdf" => data.starts_with(b"%PDF"),
        // 未知格式 - 默认拒绝
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(validate_magic_bytes(b"%PDF-1.4", ".pdf"));
        assert!(validate_magic_bytes(b"%PDF-1.7", ".PDF"));
        assert!(!validate_magic_bytes(b"PK\x03\x04", ".pdf"));
    }

    #[test]
    fn test_empty_data() {
        assert!(!validate_magic_bytes(&[], ".pdf"));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(!validate_magic_bytes(b"%PDF-1.4", ".exe"));
    }
}
