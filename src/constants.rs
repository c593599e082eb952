/// 默认每次出题数
pub const DEFAULT_QUIZ_COUNT: u64 = 25;

/// 单次出题数上限
pub const MAX_QUIZ_COUNT: u64 = 50;

/// 题库缓存默认 TTL（秒）；0 表示关闭缓存
pub const DEFAULT_BANK_CACHE_TTL_SECS: u64 = 300;

/// 姓名最大长度（字符数）
pub const MAX_NAME_LEN: usize = 64;

/// 学号最大长度（字符数）
pub const MAX_STUDENT_ID_LEN: usize = 32;

/// 提交答案最大长度（字符数）
pub const MAX_ANSWER_LEN: usize = 256;
