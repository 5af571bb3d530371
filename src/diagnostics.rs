//! The diagnostics model: a fixed code table (`W1001`, `W1002`, `E2001`..`E2127`), the
//! [`DiagnosticsSink`] that accumulates them in source order, and the [`Halt`] sentinel used to
//! unwind out of a semantic pass once its first error has been recorded.
//!
//! Diagnostics are data, never `Err` values threaded through `anyhow`: a pass that hits a rule
//! violation records the diagnostic in the sink and returns `Err(Halt)` purely to stop walking
//! the rest of that pass, per the spec's semantic-pass and error-handling sections ("the first error within a pass raises and terminates
//! that pass").

use crate::location::{FileTable, Location};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

macro_rules! codes {
    ($($variant:ident = $num:expr),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Code {
            $($variant),+
        }

        impl Code {
            pub fn number(self) -> u32 {
                match self {
                    $(Code::$variant => $num),+
                }
            }

            pub fn letter(self) -> char {
                if self.number() < 2000 { 'W' } else { 'E' }
            }

            pub fn severity(self) -> Severity {
                if self.number() < 2000 { Severity::Warning } else { Severity::Error }
            }
        }

        impl fmt::Display for Code {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.letter(), self.number())
            }
        }
    };
}

codes! {
    W1001 = 1001, W1002 = 1002,
    E2001 = 2001, E2002 = 2002, E2003 = 2003, E2004 = 2004, E2005 = 2005,
    E2006 = 2006, E2007 = 2007, E2008 = 2008, E2009 = 2009, E2010 = 2010,
    E2011 = 2011, E2012 = 2012, E2013 = 2013, E2014 = 2014, E2015 = 2015,
    E2016 = 2016, E2017 = 2017, E2018 = 2018, E2019 = 2019, E2020 = 2020,
    E2021 = 2021, E2022 = 2022, E2023 = 2023, E2024 = 2024, E2025 = 2025,
    E2026 = 2026, E2027 = 2027, E2028 = 2028, E2029 = 2029, E2030 = 2030,
    E2031 = 2031, E2032 = 2032, E2033 = 2033, E2034 = 2034, E2035 = 2035,
    E2036 = 2036, E2037 = 2037, E2038 = 2038, E2039 = 2039, E2040 = 2040,
    E2041 = 2041, E2042 = 2042, E2043 = 2043, E2044 = 2044, E2045 = 2045,
    E2046 = 2046, E2047 = 2047, E2048 = 2048, E2049 = 2049, E2050 = 2050,
    E2051 = 2051, E2052 = 2052, E2053 = 2053, E2054 = 2054, E2055 = 2055,
    E2056 = 2056, E2057 = 2057, E2058 = 2058, E2059 = 2059, E2060 = 2060,
    E2061 = 2061, E2062 = 2062, E2063 = 2063, E2064 = 2064, E2065 = 2065,
    E2066 = 2066, E2067 = 2067, E2068 = 2068, E2069 = 2069, E2070 = 2070,
    E2071 = 2071, E2072 = 2072, E2073 = 2073, E2074 = 2074, E2075 = 2075,
    E2076 = 2076, E2077 = 2077, E2078 = 2078, E2079 = 2079, E2080 = 2080,
    E2081 = 2081, E2082 = 2082, E2083 = 2083, E2084 = 2084, E2085 = 2085,
    E2086 = 2086, E2087 = 2087, E2088 = 2088, E2089 = 2089, E2090 = 2090,
    E2091 = 2091, E2092 = 2092, E2093 = 2093, E2094 = 2094, E2095 = 2095,
    E2096 = 2096, E2097 = 2097, E2098 = 2098, E2099 = 2099, E2100 = 2100,
    E2101 = 2101, E2102 = 2102, E2103 = 2103, E2104 = 2104, E2105 = 2105,
    E2106 = 2106, E2107 = 2107, E2108 = 2108, E2109 = 2109, E2110 = 2110,
    E2111 = 2111, E2112 = 2112, E2113 = 2113, E2114 = 2114, E2115 = 2115,
    E2116 = 2116, E2117 = 2117, E2118 = 2118, E2119 = 2119, E2120 = 2120,
    E2121 = 2121, E2122 = 2122, E2123 = 2123, E2124 = 2124, E2125 = 2125,
    E2126 = 2126, E2127 = 2127,
}

/// Arguments interpolated into a diagnostic's message template.
#[derive(Debug, Clone)]
pub enum Arg {
    S(String),
    I(i64),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::S(s) => write!(f, "{}", s),
            Arg::I(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::S(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::S(s)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::I(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::I(v as i64)
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Arg::I(v as i64)
    }
}

impl From<char> for Arg {
    fn from(v: char) -> Self {
        Arg::S(v.to_string())
    }
}

/// Renders the fixed message template for `code`. Each code corresponds to exactly one rule in
/// the specification; wording follows `idl-results.h`/`errors.hpp` where the two agree,
/// and `idl-results.h` where they don't (see DESIGN.md for the two codes where they conflict).
pub fn format_message(code: Code, args: &[Arg]) -> String {
    use Code::*;
    match code {
        W1001 => format!("there is no information about the author ('author' attribute) in the '{}' declaration", args[0]),
        W1002 => format!("the declaration '{}' does not contain information about copyright (attribute 'copyright')", args[0]),
        E2001 => format!("unexpected character '{}'", args[0]),
        E2002 => "tabs are not allowed".to_string(),
        E2003 => format!("the name or type must start with a capital letter '{}'", args[0]),
        E2004 => "there can only be one api declaration".to_string(),
        E2005 => format!("there is no documentation in the declaration '{}'", args[0]),
        E2006 => "documentation cannot be an empty string".to_string(),
        E2007 => "the brief should only be listed once in the documentation".to_string(),
        E2008 => "the detail should only be listed once in the documentation".to_string(),
        E2009 => "the copyright should only be listed once in the documentation".to_string(),
        E2010 => "the license should only be listed once in the documentation".to_string(),
        E2011 => "multi-line documentation must start with 4 spaces".to_string(),
        E2012 => "the .idl file must start with the 'api' element".to_string(),
        E2013 => format!("attribute '{}' cannot be duplicated", args[0]),
        E2014 => format!("the following attributes: {} - are allowed in this context", args[0]),
        E2015 => format!("unknown attribute '{}'", args[0]),
        E2016 => "the 'platform' attribute must specify at least one argument".to_string(),
        E2017 => format!("the following arguments: {} - are allowed in 'platform' attribute", args[0]),
        E2018 => format!("argument '{}' in the 'platform' attribute cannot be duplicated", args[0]),
        E2019 => "inline documentation only [detail] description is allowed".to_string(),
        E2020 => format!("invalid attribute {} in documentation", args[0]),
        E2021 => "it is acceptable to use either documentation or inline documentation, but not both".to_string(),
        E2022 => "constants can only be added to an enumeration type".to_string(),
        E2023 => "the 'value' attribute must specify the value in the argument".to_string(),
        E2024 => "the 'value' attribute must contain only one value".to_string(),
        E2025 => "the 'value' attribute must specify an integer".to_string(),
        E2026 => format!("an enumeration '{}' must contain at least one constant", args[0]),
        E2027 => "fields can only be added to a structured type".to_string(),
        E2028 => "the 'type' attribute must specify the type in the argument".to_string(),
        E2029 => "the 'type' attribute must contain only one type".to_string(),
        E2030 => format!("symbol redefinition '{}'", args[0]),
        E2031 => "enumeration constants can only be specified as integers or enum consts".to_string(),
        E2032 => format!("symbol definition '{}' not found", args[0]),
        E2033 => format!("a constant '{}' cannot refer to itself when evaluated", args[0]),
        E2034 => "constants can only refer to other constants when evaluated".to_string(),
        E2035 => format!("declaration '{}' is not a type", args[0]),
        E2036 => "enumeration constant can only be of type 'Int32'".to_string(),
        E2037 => format!("identifiers are case sensitive, error in '{}', but expected '{}'", args[0], args[1]),
        E2038 => "constant cannot go beyond the range of Int32 [-2147483648, 2147483647]".to_string(),
        E2039 => format!("constant '{}' was duplicated", args[0]),
        E2040 => format!("cyclic dependence of constant '{}'", args[0]),
        E2041 => format!("could not find file '{}' for import", args[0]),
        E2042 => format!("failed to open file '{}'", args[0]),
        E2043 => "methods can only be added to a interface type".to_string(),
        E2044 => "arguments can only be added to a method, function or callback".to_string(),
        E2045 => "out of memory".to_string(),
        E2046 => format!("static method '{}' cannot include argument '{}' with attribute 'this'", args[0], args[1]),
        E2047 => format!("constructor '{}' cannot include argument '{}' with attribute 'this'", args[0], args[1]),
        E2048 => format!("method '{}' must include one argument with the 'this' attribute", args[0]),
        E2049 => "the 'get' attribute must specify a reference to the method in the argument".to_string(),
        E2050 => "the 'set' attribute must specify a reference to the method in the argument".to_string(),
        E2051 => format!("argument '{}' of method '{}' cannot be of type 'Void'", args[0], args[1]),
        E2052 => format!("the property '{}' must contain at least the 'get' attribute or the 'set' attribute or both", args[0]),
        E2053 => format!("getter '{}' must be a method", args[0]),
        E2054 => format!("property getter '{}' from '{}' refers to a method '{}' from another interface '{}'", args[0], args[1], args[2], args[3]),
        E2055 => format!("if the getter method '{}' is static, then the property '{}' must also be static, and vice versa", args[0], args[1]),
        E2056 => format!("a static getter method '{}' must not have arguments", args[0]),
        E2057 => format!("a getter method '{}' must have one argument", args[0]),
        E2058 => format!("getter method {} cannot return 'Void'", args[0]),
        E2059 => format!("setter '{}' must be a method", args[0]),
        E2060 => format!("if the setter method '{}' is static, then the property '{}' must also be static, and vice versa", args[0], args[1]),
        E2061 => format!("property setter '{}' from '{}' refers to a method '{}' from another interface '{}'", args[0], args[1], args[2], args[3]),
        E2062 => format!("a static setter method '{}' must have one argument", args[0]),
        E2063 => format!("a setter method '{}' must have two arguments", args[0]),
        E2064 => format!("the return type '{}' of the getter method '{}' is different from the argument type '{}' of the setter method '{}'", args[0], args[1], args[2], args[3]),
        E2065 => format!("the property type '{}' does not match the return type '{}' of the getter method '{}'", args[0], args[1], args[2]),
        E2066 => format!("the property type '{}' does not match the setter method '{}' argument type '{}'", args[0], args[1], args[2]),
        E2067 => format!("failed to create file '{}'", args[0]),
        E2068 => format!("field '{}' of struct '{}' cannot be of type 'Void'", args[0], args[1]),
        E2069 => format!("the handle type must be specified for '{}'", args[0]),
        E2070 => format!("the handle type must be struct for '{}'", args[0]),
        E2071 => format!("the structure '{}' specified in the handle type '{}' must be marked with the 'handle' attribute", args[0], args[1]),
        E2072 => format!("it is not possible to add the 'noerror' attribute to the '{}' constant because the '{}' enum does not have the 'errorcode' attribute", args[0], args[1]),
        E2073 => format!("function '{}' argument '{}' cannot be marked with the 'this' attribute", args[0], args[1]),
        E2074 => format!("argument '{}' of function '{}' cannot be of type 'Void'", args[0], args[1]),
        E2075 => "the 'cname' attribute must specify a string in the argument".to_string(),
        E2076 => "the 'array' attribute must specify a size in the argument".to_string(),
        E2077 => format!("fixed size array '{}' of structure '{}' must be of size 1 or more", args[0], args[1]),
        E2078 => format!("the 'array' attribute of the '{}' must point to a field of the structure or set fixed size value", args[0]),
        E2079 => "the reference to the dynamic size array is located outside the visibility of the structure".to_string(),
        E2080 => format!("the 'array' attribute for array '{}' must point to an integer field for a dynamic array", args[0]),
        E2081 => format!("an struct '{}' must contain at least one field", args[0]),
        E2082 => "there can be only one argument with the 'userdata' attribute".to_string(),
        E2083 => format!("callback '{}' argument '{}' cannot be marked with the 'this' attribute", args[0], args[1]),
        E2084 => "there can be only one argument with the 'result' attribute".to_string(),
        E2085 => "the function to convert an error code to a string must return a string and take one argument (the error code)".to_string(),
        E2086 => "the method for incrementing the reference counter of an object must be non-static and take one argument 'this'".to_string(),
        E2087 => "the method for destroy of an object must be non-static and take one argument 'this'".to_string(),
        E2088 => "there can only be one method to increment reference counter".to_string(),
        E2089 => "there can only be one method to destroy object".to_string(),
        E2090 => "events can only be added to a interface type".to_string(),
        E2091 => format!("the event '{}' must contain at least the 'get' attribute or the 'set' attribute or both", args[0]),
        E2092 => format!("event getter '{}' from '{}' refers to a method '{}' from another interface '{}'", args[0], args[1], args[2], args[3]),
        E2093 => format!("if the getter method '{}' is static, then the event '{}' must also be static, and vice versa", args[0], args[1]),
        E2094 => format!("static getter '{}' for event must have no arguments or one argument 'userdata'", args[0]),
        E2095 => format!("getter '{}' for event must have one argument or two arguments 'this' and 'userdata'", args[0]),
        E2096 => format!("event setter '{}' from '{}' refers to a method '{}' from another interface '{}'", args[0], args[1], args[2], args[3]),
        E2097 => format!("if the setter method '{}' is static, then the event '{}' must also be static, and vice versa", args[0], args[1]),
        E2098 => format!("static setter '{}' for event must have one argument or one argument and 'userdata'", args[0]),
        E2099 => format!("setter '{}' for event must have two arguments 'this' and 'value' or three arguments 'this', 'value' and 'userdata'", args[0]),
        E2100 => format!("the event type '{}' does not match the return type '{}' of the getter method '{}'", args[0], args[1], args[2]),
        E2101 => format!("the event type '{}' does not match the setter method '{}' argument type '{}'", args[0], args[1], args[2]),
        E2102 => format!("the argument '{}' of a method, function, or callback ('{}') cannot be a fixed-size array", args[0], args[1]),
        E2103 => "the reference to the dynamic size array is located outside the visibility of the method".to_string(),
        E2104 => format!("the 'array' attribute of the '{}' must point to an argument of the method", args[0]),
        E2105 => "the reference to the dynamic size array is located outside the visibility of the function".to_string(),
        E2106 => format!("the 'array' attribute of the '{}' must point to an argument of the function", args[0]),
        E2107 => "the reference to the dynamic size array is located outside the visibility of the callback".to_string(),
        E2108 => format!("the 'array' attribute of the '{}' must point to an argument of the callback", args[0]),
        E2109 => "the 'tokenizer' attribute must specify an indices string in the argument".to_string(),
        E2110 => "the 'version' attribute must specify a semver in the argument".to_string(),
        E2111 => format!("the '{}' declaration does not have a brief ('brief' attribute) or detailed description ('detail' attribute)", args[0]),
        E2112 => "the 'datasize' attribute must specify a size in the argument".to_string(),
        E2113 => format!("the 'datasize' attribute of the '{}' must point to a field of the structure", args[0]),
        E2114 => format!("the 'datasize' attribute of the '{}' must point to an integer field to specify the buffer size", args[0]),
        E2115 => format!("the 'datasize' attribute of the '{}' must point to an argument of the method", args[0]),
        E2116 => format!("the 'datasize' attribute of the '{}' must point to an argument of the function", args[0]),
        E2117 => format!("the 'datasize' attribute of the '{}' must point to an argument of the callback", args[0]),
        E2118 => "the reference to the size buffer is located outside the visibility of the structure".to_string(),
        E2119 => "the 'datasize' attribute is only applicable to fields of type 'Data' or 'ConstData'".to_string(),
        E2120 => "the reference to the size buffer is located outside the visibility of the callback".to_string(),
        E2121 => "the 'datasize' attribute is only applicable to arguments of type 'Data' or 'ConstData'".to_string(),
        E2122 => "the reference to the size buffer is located outside the visibility of the function".to_string(),
        E2123 => "the reference to the size buffer is located outside the visibility of the method".to_string(),
        E2124 => format!("'{}' can only specify either the 'datasize' or 'array' attribute, but not both", args[0]),
        E2125 => format!("'{}' cannot contain attribute 'errorcode'", args[0]),
        E2126 => "the 'refinc' attribute can only be applied to a method".to_string(),
        E2127 => "the 'destroy' attribute can only be applied to a method".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Code,
    pub severity: Severity,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Sentinel returned by a pass function once it has recorded its first error; callers propagate
/// it with `?` purely to stop walking, never to hide the diagnostic (it is already in the sink).
#[derive(Debug, Clone, Copy)]
pub struct Halt;

pub type PassResult<T> = Result<T, Halt>;

#[derive(Debug)]
pub struct DiagnosticsSink {
    diagnostics: Vec<Diagnostic>,
    warnings_as_errors: bool,
}

impl DiagnosticsSink {
    pub fn new(warnings_as_errors: bool) -> Self {
        Self { diagnostics: Vec::new(), warnings_as_errors }
    }

    fn push(&mut self, code: Code, loc: Location, files: &FileTable, args: &[Arg]) {
        self.diagnostics.push(Diagnostic {
            code,
            severity: code.severity(),
            message: format_message(code, args),
            file: files.name(loc.start.file).to_string(),
            line: loc.start.line,
            column: loc.start.column,
        });
    }

    /// Records an error and returns the [`Halt`] sentinel for the caller to propagate.
    pub fn error(&mut self, code: Code, loc: Location, files: &FileTable, args: &[Arg]) -> Halt {
        debug_assert_eq!(code.severity(), Severity::Error, "{code} is not an error code");
        self.push(code, loc, files, args);
        Halt
    }

    /// Records a warning. Warnings never halt the current pass.
    pub fn warn(&mut self, code: Code, loc: Location, files: &FileTable, args: &[Arg]) {
        debug_assert_eq!(code.severity(), Severity::Warning, "{code} is not a warning code");
        self.push(code, loc, files, args);
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn has_hard_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.has_hard_errors() || (self.warnings_as_errors && self.has_warnings())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{FileId, Position};

    #[test]
    fn codes_below_2000_are_warnings_and_above_are_errors() {
        assert_eq!(Code::W1001.severity(), Severity::Warning);
        assert_eq!(Code::W1002.severity(), Severity::Warning);
        assert_eq!(Code::E2001.severity(), Severity::Error);
        assert_eq!(Code::E2127.severity(), Severity::Error);
    }

    #[test]
    fn code_display_combines_letter_and_number() {
        assert_eq!(Code::E2037.to_string(), "E2037");
        assert_eq!(Code::W1001.to_string(), "W1001");
    }

    #[test]
    fn sink_records_location_and_formatted_message() {
        let files = FileTable::new();
        let file = files.intern("root.idl");
        let loc = Location::point(Position::new(file, 3, 7));
        let mut sink = DiagnosticsSink::new(false);
        let _ = sink.error(Code::E2032, loc, &files, &[Arg::from("Widget")]);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Code::E2032);
        assert_eq!(diags[0].line, 3);
        assert_eq!(diags[0].column, 7);
        assert_eq!(diags[0].file, "root.idl");
        assert!(diags[0].message.contains("Widget"));
    }

    #[test]
    fn warnings_as_errors_flag_promotes_sink_has_errors() {
        let files = FileTable::new();
        let file = files.intern("root.idl");
        let loc = Location::point(Position::new(file, 1, 1));
        let mut sink = DiagnosticsSink::new(true);
        sink.warn(Code::W1001, loc, &files, &[Arg::from("Api")]);
        assert!(!sink.has_hard_errors());
        assert!(sink.has_errors());
    }
}
