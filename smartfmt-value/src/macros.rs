//! Construction macros for building argument graphs in tests and callers.

/// Build a [`Value::List`](crate::Value::List) from expressions convertible
/// into [`Value`](crate::Value).
///
/// ```
/// use smartfmt_value::{Value, list};
/// let v = list![1, "two", 3.0];
/// assert_eq!(v.index(1).and_then(Value::as_str), Some("two"));
/// ```
#[macro_export]
macro_rules! list {
    () => { $crate::Value::List(::std::sync::Arc::from(Vec::<$crate::Value>::new())) };
    ($($item:expr),+ $(,)?) => {
        $crate::Value::from(vec![$($crate::Value::from($item)),+])
    };
}

/// Build a [`Value::Map`](crate::Value::Map) from `key => value` pairs.
///
/// ```
/// use smartfmt_value::{Value, map};
/// let v = map! { "name" => "Ada", "age" => 36 };
/// assert_eq!(v.get("age").and_then(Value::as_i64), Some(36));
/// ```
#[macro_export]
macro_rules! map {
    () => { $crate::Value::Map(::std::sync::Arc::new($crate::Map::new())) };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Map::new();
        $(map.insert(::std::string::String::from($key), $crate::Value::from($value));)+
        $crate::Value::Map(::std::sync::Arc::new(map))
    }};
}
