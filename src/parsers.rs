#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

peg::parser! {
    /// includes grammars for course reports, their column headers and
    /// doctest example calls.
    pub grammar parser() for str {
        /// matches any sequence of 1 or more numbers
        rule number() -> u32
            = n:$(['0'..='9']+) {? n.parse().or(Err("u32")) }

        /// matches any number of spaces or tabs
        rule whitespace() = quiet!{[' ' | '\t']+}

        /// matches a line break
        rule eol() = "\r"? "\n"

        /// a character inside a quoted CSV field; doubled quotes are escapes
        rule quoted_char() -> char
            = "\"\"" { '"' }
            / c:[^ '"'] { c }

        /// a CSV field wrapped in double quotes, may span lines
        rule quoted_field() -> String
            = "\"" cs:quoted_char()* "\"" { cs.into_iter().collect() }

        /// a CSV field without quotes
        rule bare_field() -> String
            = s:$([^ ',' | '\n' | '\r']*) { s.to_string() }

        /// any CSV field
        rule field() -> String
            = quoted_field() / bare_field()

        /// one CSV record
        rule record() -> Vec<String>
            = fields:(field() ++ ",") { fields }

        /// parses a whole CSV document into records, blank lines included
        pub rule csv() -> Vec<Vec<String>>
            = records:(record() ** eol()) eol()? { records }

        /// matches the `(points)` suffix of a column header
        rule points_suffix() -> u32
            = "(" whitespace()? n:number() whitespace()? ")" whitespace()? { n }

        /// parses the points a report column is worth from its trailing
        /// `(points)`, e.g. `Lab 3 - Lab (10)`
        pub rule column_points() -> u32
            = (!(points_suffix() ![_]) [_])* n:points_suffix() { n }

        /// matches an identifier
        rule ident() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)

        /// parses a doctest call such as `add(2, 3)` into the function name
        /// and the raw argument text
        pub rule call() -> (&'input str, &'input str)
            = whitespace()?
              name:ident()
              whitespace()?
              "("
              args:$((!(")" whitespace()? ![_]) [_])*)
              ")"
              whitespace()?
            { (name, args.trim()) }
    }
}
