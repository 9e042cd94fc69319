use crate::runtime::error::{self, ErrorCode, ForthError};

/// Sizing and behaviour knobs for one interpreter instance.  The defaults are suitable for a
/// desktop host; embedded hosts will usually shrink the stacks and buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum depth of the data stack.
    pub data_stack_size: usize,

    /// Maximum depth of the return stack, which bounds the nesting of word calls.
    pub code_stack_size: usize,

    /// Maximum depth of the loop control stack.  Every active counted loop uses three cells.
    pub loop_stack_size: usize,

    /// Maximum depth of the parser's saved hook stack.
    pub hook_stack_size: usize,

    /// Maximum number of bytes held in the parser's token or block buffer.
    pub parser_buffer_size: usize,

    /// Maximum length of the name of a definition.
    pub custom_name_size: usize,

    /// Fold ASCII case when hashing word names.
    pub case_insensitive: bool,

    /// Catch panics raised while executing a node and turn them into errors.
    pub trap_faults: bool,

    /// How many alias links are followed before a chain is considered cyclic.
    pub max_alias_hops: usize,

    /// How deeply macros may expand into other macros.
    pub max_macro_depth: usize,

    /// Feed the bundled prelude when the interpreter starts.
    pub load_prelude: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            data_stack_size: 100,
            code_stack_size: 100,
            loop_stack_size: 100,
            hook_stack_size: 64,
            parser_buffer_size: 700,
            custom_name_size: 25,
            case_insensitive: true,
            trap_faults: true,
            max_alias_hops: 64,
            max_macro_depth: 64,
            load_prelude: true,
        }
    }
}

impl RuntimeConfig {
    pub fn with_data_stack_size(mut self, size: usize) -> Self {
        self.data_stack_size = size;
        self
    }

    pub fn with_code_stack_size(mut self, size: usize) -> Self {
        self.code_stack_size = size;
        self
    }

    pub fn with_loop_stack_size(mut self, size: usize) -> Self {
        self.loop_stack_size = size;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_trap_faults(mut self, trap_faults: bool) -> Self {
        self.trap_faults = trap_faults;
        self
    }

    pub fn with_prelude(mut self, load_prelude: bool) -> Self {
        self.load_prelude = load_prelude;
        self
    }

    /// Check that the configuration can run at all.  The prelude needs a few cells of every stack
    /// and a name buffer large enough for its own definitions.
    pub fn validate(&self) -> error::Result<()> {
        let checks = [
            (self.data_stack_size, "data_stack_size"),
            (self.code_stack_size, "code_stack_size"),
            (self.loop_stack_size, "loop_stack_size"),
            (self.hook_stack_size, "hook_stack_size"),
            (self.parser_buffer_size, "parser_buffer_size"),
            (self.custom_name_size, "custom_name_size"),
            (self.max_alias_hops, "max_alias_hops"),
        ];

        for (value, name) in checks {
            if value == 0 {
                return ForthError::new_as_result(
                    ErrorCode::ConfigError,
                    format!("{} must be greater than zero.", name),
                );
            }
        }

        if self.loop_stack_size < 3 {
            return ForthError::new_as_result(
                ErrorCode::ConfigError,
                "loop_stack_size must hold at least one loop (3 cells).".to_string(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_sized_stack_is_rejected() {
        let config = RuntimeConfig::default().with_data_stack_size(0);
        let error = config.validate().unwrap_err();

        assert_eq!(error.code(), ErrorCode::ConfigError);
        assert!(error.message().contains("data_stack_size"));
    }

    #[test]
    fn tiny_loop_stack_is_rejected() {
        let config = RuntimeConfig::default().with_loop_stack_size(2);

        assert!(config.validate().is_err());
    }
}
