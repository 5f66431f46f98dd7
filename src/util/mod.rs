/// serde 轉換輔助
pub mod convert;
/// HTTP 請求
pub mod http;
/// 文字與數字格式
pub mod text;
