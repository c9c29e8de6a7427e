pub mod handlers;
pub mod kakao;
