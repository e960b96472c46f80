//! Language name normalization.
//!
//! Sources spell the same language differently ("golang", "Bash/Shell",
//! "Delphi/Object Pascal"). Names are merged through a fixed alias table.

use std::borrow::Cow;

/// Lowercased alias → canonical display name.
static LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("c/c++", "C/C++"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("c", "C"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("go", "Go"),
    ("golang", "Go"),
    ("rust", "Rust"),
    ("php", "PHP"),
    ("ruby", "Ruby"),
    ("swift", "Swift"),
    ("kotlin", "Kotlin"),
    ("scala", "Scala"),
    ("r", "R"),
    ("perl", "Perl"),
    ("lua", "Lua"),
    ("dart", "Dart"),
    ("shell", "Shell"),
    ("bash/shell", "Shell"),
    ("bash", "Shell"),
    ("powershell", "PowerShell"),
    ("html/css", "HTML/CSS"),
    ("html", "HTML/CSS"),
    ("css", "CSS"),
    ("sql", "SQL"),
    ("matlab", "MATLAB"),
    ("objective-c", "Objective-C"),
    ("objectivec", "Objective-C"),
    ("assembly", "Assembly"),
    ("assembly language", "Assembly"),
    ("haskell", "Haskell"),
    ("clojure", "Clojure"),
    ("elixir", "Elixir"),
    ("erlang", "Erlang"),
    ("julia", "Julia"),
    ("f#", "F#"),
    ("visual basic", "Visual Basic"),
    ("vba", "VBA"),
    ("classic visual basic", "Visual Basic"),
    ("delphi/pascal", "Delphi/Pascal"),
    ("delphi/object pascal", "Delphi/Pascal"),
    ("delphi", "Delphi/Pascal"),
    ("groovy", "Groovy"),
    ("cobol", "COBOL"),
    ("fortran", "Fortran"),
    ("ada", "Ada"),
    ("prolog", "Prolog"),
    ("lisp", "Lisp"),
    ("ocaml", "OCaml"),
    ("nim", "Nim"),
    ("zig", "Zig"),
    ("crystal", "Crystal"),
    ("coffeescript", "CoffeeScript"),
    ("emacs lisp", "Emacs Lisp"),
];

/// Map a source's language name to its canonical display name.
///
/// Lookup is case-insensitive and ignores surrounding whitespace. Names not in
/// the alias table are returned exactly as given.
pub fn normalize_language_name(name: &str) -> Cow<'_, str> {
    let key = name.trim().to_lowercase();

    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| Cow::Borrowed(*canonical))
        .unwrap_or(Cow::Borrowed(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_merge() {
        assert_eq!(normalize_language_name("golang"), "Go");
        assert_eq!(normalize_language_name("Go"), "Go");
        assert_eq!(normalize_language_name("GO"), "Go");
        assert_eq!(normalize_language_name("Bash/Shell"), "Shell");
        assert_eq!(normalize_language_name("c/c++"), "C/C++");
        assert_eq!(normalize_language_name("Delphi"), "Delphi/Pascal");
        assert_eq!(normalize_language_name("Delphi/Object Pascal"), "Delphi/Pascal");
    }

    #[test]
    fn test_trims_before_lookup() {
        assert_eq!(normalize_language_name("  python \n"), "Python");
    }

    #[test]
    fn test_canonical_names_are_fixed_points() {
        for (_, canonical) in LANGUAGE_ALIASES {
            let once = normalize_language_name(canonical);
            assert_eq!(once, *canonical);
            assert_eq!(normalize_language_name(&once), once);
        }
    }

    #[test]
    fn test_unknown_names_pass_through() {
        assert_eq!(normalize_language_name("Brainfuck"), "Brainfuck");
        assert_eq!(normalize_language_name(" Jupyter Notebook "), " Jupyter Notebook ");
        assert!(matches!(normalize_language_name("Gleam"), Cow::Borrowed("Gleam")));
    }
}
