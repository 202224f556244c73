/*!
 * Common test utilities for the arxlate test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Route library logs to the test harness; `RUST_LOG=debug` shows them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    init_test_logging();
    Ok(TempDir::new()?)
}

/// Creates a test file (and its parent directories) with the given content
pub fn create_test_file(dir: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub const MAIN_TEX: &str = r"\documentclass[11pt]{article}
\usepackage{amsmath}
\input{macros}
\newtheorem{theorem}{Theorem}
\title{A Study of Things}
\begin{document}
\maketitle
\begin{abstract}
We study a family of interesting objects and report several findings.
\end{abstract}
\input{sections/intro}
\input{sections/method}
\section{Conclusion}\label{sec:conclusion}
In conclusion, the method works well on every benchmark we tried \cite{smith2020}.
\bibliographystyle{plain}
\bibliography{refs}
\end{document}
";

pub const MACROS_TEX: &str = r"% shared macros
\newcommand{\R}{\mathbb{R}}
\newcommand{\eps}{\varepsilon}
\DeclareMathOperator{\tr}{tr}
";

pub const INTRO_TEX: &str = r"\section{Introduction}\label{sec:intro}
Large models have changed how we approach many problems \cite{doe2021}.
We write $f: \R \to \R$ for a smooth function and study its behavior.
\begin{theorem}Every bounded sequence has a convergent subsequence.\end{theorem}
This observation motivates the rest of the paper, see Section~\ref{sec:method}.
";

pub const METHOD_TEX: &str = r"\section{Method}\label{sec:method}
Our approach proceeds in two stages, described below in some detail.
\begin{equation}
  \mathcal{L} = \sum_i \ell(x_i, y_i) + \eps \|w\|^2
\end{equation}
The first stage estimates parameters % tuned by hand
and the second stage refines them until convergence.
";

pub const STYLE_STY_TEX: &str = r"\ProvidesFile{localstyle.tex}
\setlength{\parindent}{0pt}
";

pub const SUPPLEMENT_TEX: &str = r"\documentclass{article}
\begin{document}
This supplementary note is compiled separately from the main paper.
\end{document}
";

/// Writes a small multi-file paper and returns its root directory
pub fn create_sample_paper(dir: &Path) -> Result<PathBuf> {
    let root = dir.join("paper");
    create_test_file(&root, "main.tex", MAIN_TEX)?;
    create_test_file(&root, "macros.tex", MACROS_TEX)?;
    create_test_file(&root, "sections/intro.tex", INTRO_TEX)?;
    create_test_file(&root, "sections/method.tex", METHOD_TEX)?;
    create_test_file(&root, "localstyle.tex", STYLE_STY_TEX)?;
    create_test_file(&root, "supplement.tex", SUPPLEMENT_TEX)?;
    create_test_file(&root, "refs.bib", "@article{smith2020, title={T}}\n")?;
    Ok(root)
}

/// LaTeX snippets exercising every skip-span pass
pub fn tricky_documents() -> Vec<&'static str> {
    vec![
        "\\begin{document}\\section{Intro}Hello world.\\cite{a}\\end{document}",
        MAIN_TEX,
        INTRO_TEX,
        METHOD_TEX,
        "Costs 50\\% more, i.e. \\$5 per unit; $x$ is fine. % trailing comment",
        "Unicode prose: café, naïve, Straße, 日本語のテキスト and $\\alpha$ math.",
        "\\begin{align*}a &= b \\\\ c &= d\\end{align*} then prose after the display.",
        "Unclosed \\begin{equation} x = 1 and text continues without an end.",
        "Nested \\begin{cases}a\\begin{cases}b\\end{cases}\\end{cases} closing words here.",
        "Display \\[ x^2 \\] and inline \\( y \\) mixed with ordinary words.",
        "$$ unclosed display math and some more words to read",
        "\\href{https://example.org/~user}{the project page} is linked from here.",
        "",
        "   \n\n  ",
    ]
}
