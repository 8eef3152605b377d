use std::fmt::Debug;

/// An item that can travel through a blocking queue.<br/>
/// ブロッキングキューを流れる要素。
pub trait Element: Debug + Send + 'static {}

impl<T: Debug + Send + 'static> Element for T {}
