//! File-extension and encoding hints for GitHub linguist names.

/// `(linguist name, extensions, encoding)`.
const LANGUAGES: &[(&str, &str, &str)] = &[
    ("Python", ".py, .pyw, .pyi, .pyx", "UTF-8"),
    ("JavaScript", ".js, .mjs, .cjs, .jsx", "UTF-8"),
    ("TypeScript", ".ts, .tsx, .mts, .cts", "UTF-8"),
    ("Java", ".java", "UTF-8"),
    ("C", ".c, .h", "UTF-8"),
    ("C++", ".cpp, .cc, .cxx, .hpp, .hh, .h", "UTF-8"),
    ("C#", ".cs, .csx", "UTF-8"),
    ("Go", ".go", "UTF-8"),
    ("Rust", ".rs", "UTF-8"),
    ("Ruby", ".rb, .rbw, .rake, .gemspec", "UTF-8"),
    ("PHP", ".php, .phtml, .php3, .php4, .php5", "UTF-8"),
    ("Swift", ".swift", "UTF-8"),
    ("Kotlin", ".kt, .kts", "UTF-8"),
    ("Scala", ".scala, .sc", "UTF-8"),
    ("Shell", ".sh, .bash, .zsh, .fish", "UTF-8"),
    ("PowerShell", ".ps1, .psm1, .psd1", "UTF-8"),
    ("Perl", ".pl, .pm, .pod, .t", "UTF-8"),
    ("R", ".r, .R, .Rmd", "UTF-8"),
    ("Lua", ".lua", "UTF-8"),
    ("Dart", ".dart", "UTF-8"),
    ("Elixir", ".ex, .exs", "UTF-8"),
    ("Erlang", ".erl, .hrl", "UTF-8"),
    ("Haskell", ".hs, .lhs", "UTF-8"),
    ("Clojure", ".clj, .cljs, .cljc, .edn", "UTF-8"),
    ("F#", ".fs, .fsi, .fsx", "UTF-8"),
    ("OCaml", ".ml, .mli", "UTF-8"),
    ("Julia", ".jl", "UTF-8"),
    ("Nim", ".nim, .nims", "UTF-8"),
    ("Zig", ".zig", "UTF-8"),
    ("Crystal", ".cr", "UTF-8"),
    ("HTML", ".html, .htm, .xhtml", "UTF-8"),
    ("CSS", ".css", "UTF-8"),
    ("SCSS", ".scss", "UTF-8"),
    ("Sass", ".sass", "UTF-8"),
    ("Less", ".less", "UTF-8"),
    ("Vue", ".vue", "UTF-8"),
    ("Svelte", ".svelte", "UTF-8"),
    ("Astro", ".astro", "UTF-8"),
    ("JSON", ".json, .jsonc", "UTF-8"),
    ("YAML", ".yml, .yaml", "UTF-8"),
    ("TOML", ".toml", "UTF-8"),
    ("XML", ".xml, .xsd, .xsl", "UTF-8"),
    ("Markdown", ".md, .markdown, .mdown", "UTF-8"),
    ("reStructuredText", ".rst", "UTF-8"),
    ("TeX", ".tex, .sty, .cls", "UTF-8"),
    ("SQL", ".sql", "UTF-8"),
    ("GraphQL", ".graphql, .gql", "UTF-8"),
    ("Dockerfile", "Dockerfile", "UTF-8"),
    ("Makefile", "Makefile, .mk", "UTF-8"),
    ("CMake", "CMakeLists.txt, .cmake", "UTF-8"),
    ("Nix", ".nix", "UTF-8"),
    ("HCL", ".hcl", "UTF-8"),
    ("Jupyter Notebook", ".ipynb", "UTF-8"),
    ("Objective-C", ".m, .mm", "UTF-8"),
    ("Assembly", ".asm, .s", "ASCII"),
    ("WebAssembly", ".wat, .wasm", "Binary"),
    ("Batchfile", ".bat, .cmd", "CP1252"),
    ("Fortran", ".f, .f90, .f95, .for", "UTF-8"),
    ("COBOL", ".cob, .cbl", "EBCDIC/UTF-8"),
    ("Groovy", ".groovy, .gvy", "UTF-8"),
    ("Emacs Lisp", ".el", "UTF-8"),
    ("Vim Script", ".vim", "UTF-8"),
    ("Protocol Buffer", ".proto", "UTF-8"),
];

/// Extensions and encoding for a language, if known. Exact name match.
pub fn language_info(name: &str) -> Option<(&'static str, &'static str)> {
    LANGUAGES
        .iter()
        .find(|(lang, _, _)| *lang == name)
        .map(|(_, ext, enc)| (*ext, *enc))
}
