macro_rules! env_or_none {
    ($name:ident, $env:literal) => {
        #[allow(dead_code)]
        pub const $name: &str = or_none(option_env!($env));
    };
}

const fn or_none(val: Option<&'static str>) -> &'static str {
    match val {
        Some(val) => val,
        None => "<none>",
    }
}

pub const PACKAGE: &str = "cl31capture";
env_or_none!(VERSION, "VERGEN_BUILD_SEMVER");
env_or_none!(COMMIT_HASH, "VERGEN_GIT_SHA");
env_or_none!(BUILD_TIMESTAMP, "VERGEN_BUILD_TIMESTAMP");
env_or_none!(RUSTC_COMMIT_HASH, "VERGEN_RUSTC_COMMIT_HASH");

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_env_is_placeholder() {
        assert_eq!(or_none(None), "<none>");
        assert_eq!(or_none(Some("1.0.1")), "1.0.1");
        assert!(!VERSION.is_empty());
    }
}
