/// Runs a block and, with the `stats` feature enabled, logs how long it took at debug level.
#[macro_export]
#[doc(hidden)]
macro_rules! timed {
    ($name:literal, $block:block) => {{
        #[cfg(feature = "stats")]
        {
            let start = std::time::Instant::now();
            let result = $block;
            bevy::log::debug!("{} in {:?}", $name, start.elapsed());
            result
        }

        #[cfg(not(feature = "stats"))]
        {
            $block
        }
    }};
}
