mod count_down_latch;

pub use self::count_down_latch::*;
