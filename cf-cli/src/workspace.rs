//! Problem workspace on disk
//!
//! Directory structure: `{src_dir}/{group}/{name}/` holding the rendered
//! solution template `{main}.{ext}` and the sample tests
//! `{main}.{id:02}.in` / `{main}.{id:02}.ans`.

use crate::config::LanguageConfig;
use crate::error::WorkspaceError;
use cf_client::Task;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const NAME_PLACEHOLDER: &str = "__PROB_NAME__";
const URL_PLACEHOLDER: &str = "__PROB_URL__";

/// Writes parsed tasks into per-problem directories
pub struct Workspace<'a> {
    src_dir: &'a Path,
    language: &'a LanguageConfig,
    template: String,
}

impl<'a> Workspace<'a> {
    /// Load the language template from `templates_dir`, falling back to the
    /// built-in one when the file does not exist
    pub fn new(
        src_dir: &'a Path,
        templates_dir: &Path,
        language: &'a LanguageConfig,
    ) -> Result<Self, WorkspaceError> {
        let path = templates_dir.join(&language.template);
        let template = if path.exists() {
            fs::read_to_string(&path).map_err(|source| WorkspaceError::Template { path, source })?
        } else {
            default_template(&language.ext).to_string()
        };
        Ok(Self {
            src_dir,
            language,
            template,
        })
    }

    /// Directory a task is written to
    pub fn task_dir(&self, task: &Task) -> PathBuf {
        self.src_dir
            .join(sanitize(&task.group))
            .join(sanitize(&task.name))
    }

    /// Write every task in parallel, returning their directories in order
    ///
    /// Each task owns its directory, so writers never contend.
    pub fn materialize(&self, tasks: &[Task]) -> Result<Vec<PathBuf>, WorkspaceError> {
        tasks
            .par_iter()
            .map(|task| self.write_task(task))
            .collect()
    }

    fn write_task(&self, task: &Task) -> Result<PathBuf, WorkspaceError> {
        let dir = self.task_dir(task);
        fs::create_dir_all(&dir).map_err(|source| WorkspaceError::Write {
            path: dir.clone(),
            source,
        })?;

        // Never clobber a solution in progress
        let source_path = dir.join(self.language.source_file());
        if !source_path.exists() {
            write_file(&source_path, &render_template(&self.template, task))?;
        }

        for test in &task.tests {
            let (input, answer) = test_file_names(&self.language.main, &test.id);
            write_file(&dir.join(input), &test.input)?;
            write_file(&dir.join(answer), &test.output)?;
        }

        debug!(task = %task.name, dir = %dir.display(), tests = task.tests.len(), "Wrote task");
        Ok(dir)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), WorkspaceError> {
    fs::write(path, contents).map_err(|source| WorkspaceError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Fill the problem placeholders of a template
pub fn render_template(template: &str, task: &Task) -> String {
    template
        .replace(NAME_PLACEHOLDER, &task.name)
        .replace(URL_PLACEHOLDER, &task.url)
}

/// Input and answer file names of one sample test
pub fn test_file_names(main: &str, id: &str) -> (String, String) {
    (
        format!("{}.{:0>2}.in", main, id),
        format!("{}.{:0>2}.ans", main, id),
    )
}

/// Built-in template for a source extension
pub fn default_template(ext: &str) -> &'static str {
    match ext {
        "cpp" | "cc" => {
            "// __PROB_NAME__\n// __PROB_URL__\n#include <bits/stdc++.h>\nusing namespace std;\n\nint main() {\n    ios::sync_with_stdio(false);\n    cin.tie(nullptr);\n\n    return 0;\n}\n"
        }
        "py" => "# __PROB_NAME__\n# __PROB_URL__\nimport sys\ninput = sys.stdin.readline\n\n\ndef main():\n    pass\n\n\nmain()\n",
        "java" => {
            "// __PROB_NAME__\n// __PROB_URL__\nimport java.io.*;\nimport java.util.*;\n\npublic class Main {\n    public static void main(String[] args) throws IOException {\n        BufferedReader in = new BufferedReader(new InputStreamReader(System.in));\n    }\n}\n"
        }
        "rs" => {
            "// __PROB_NAME__\n// __PROB_URL__\nuse std::io::{self, Read};\n\nfn main() {\n    let mut input = String::new();\n    io::stdin().read_to_string(&mut input).unwrap();\n}\n"
        }
        _ => "__PROB_NAME__\n__PROB_URL__\n",
    }
}

/// Write the built-in template of every language lacking one
///
/// Returns the paths written.
pub fn write_default_templates<'l>(
    templates_dir: &Path,
    languages: impl IntoIterator<Item = &'l LanguageConfig>,
) -> Result<Vec<PathBuf>, WorkspaceError> {
    fs::create_dir_all(templates_dir).map_err(|source| WorkspaceError::Write {
        path: templates_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for language in languages {
        let path = templates_dir.join(&language.template);
        if path.exists() || written.contains(&path) {
            continue;
        }
        write_file(&path, default_template(&language.ext))?;
        written.push(path);
    }
    Ok(written)
}

/// Find `(contest_id, problem_index)` from a problem URL inside a source file
pub fn extract_problem_info(source: &str) -> Option<(String, String)> {
    static PROBLEM_URL: OnceLock<Regex> = OnceLock::new();
    let regex = PROBLEM_URL.get_or_init(|| Regex::new(r"/contest/(\d+)/problem/(\w+)").unwrap());
    let captures = regex.captures(source)?;
    Some((
        captures.get(1)?.as_str().to_string(),
        captures.get(2)?.as_str().to_string(),
    ))
}

/// Make a task or contest name usable as one path component
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_client::{IoDescriptor, Test};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn language() -> LanguageConfig {
        LanguageConfig {
            name: "GNU G++17".to_string(),
            id: 54,
            template: "cpp17.cpp".to_string(),
            main: "main".to_string(),
            ext: "cpp".to_string(),
        }
    }

    fn task(name: &str, tests: usize) -> Task {
        Task {
            name: name.to_string(),
            group: "Codeforces Round 886 (Div. 4)".to_string(),
            url: "https://codeforces.com/contest/1850/problem/A".to_string(),
            input: IoDescriptor::stdin(),
            output: IoDescriptor::stdout(),
            time_limit: Some(1000),
            memory_limit: Some(256),
            tests: (1..=tests)
                .map(|i| Test {
                    id: i.to_string(),
                    input: format!("{}\n", i),
                    output: format!("{}\n", i * 2),
                })
                .collect(),
        }
    }

    #[test]
    fn test_materialize_layout() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let templates = temp.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("cpp17.cpp"), "// __PROB_NAME__ @ __PROB_URL__\n").unwrap();

        let language = language();
        let workspace = Workspace::new(&src, &templates, &language).unwrap();
        let dirs = workspace
            .materialize(&[task("A. Sum", 2), task("B. Max", 0)])
            .unwrap();

        let round = src.join("Codeforces Round 886 (Div. 4)");
        assert_eq!(dirs, vec![round.join("A. Sum"), round.join("B. Max")]);
        assert_eq!(
            fs::read_to_string(round.join("A. Sum/main.cpp")).unwrap(),
            "// A. Sum @ https://codeforces.com/contest/1850/problem/A\n"
        );
        assert_eq!(fs::read_to_string(round.join("A. Sum/main.01.in")).unwrap(), "1\n");
        assert_eq!(fs::read_to_string(round.join("A. Sum/main.02.ans")).unwrap(), "4\n");
        assert!(round.join("B. Max/main.cpp").exists());
        assert!(!round.join("B. Max/main.01.in").exists());
    }

    #[test]
    fn test_existing_solution_is_kept() {
        let temp = TempDir::new().unwrap();
        let language = language();
        let workspace = Workspace::new(temp.path(), &temp.path().join("none"), &language).unwrap();
        let task = task("A. Sum", 1);

        let dir = workspace.task_dir(&task);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.cpp"), "solved").unwrap();

        workspace.materialize(std::slice::from_ref(&task)).unwrap();
        assert_eq!(fs::read_to_string(dir.join("main.cpp")).unwrap(), "solved");
        assert!(dir.join("main.01.in").exists());
    }

    #[test]
    fn test_default_templates_written_once() {
        let temp = TempDir::new().unwrap();
        let language = language();

        let written = write_default_templates(temp.path(), [&language, &language]).unwrap();
        assert_eq!(written, vec![temp.path().join("cpp17.cpp")]);
        assert!(fs::read_to_string(&written[0]).unwrap().contains(NAME_PLACEHOLDER));

        let again = write_default_templates(temp.path(), [&language]).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_extract_problem_info() {
        let source = "// A. Sum\n// https://codeforces.com/contest/1850/problem/A\nint main() {}\n";
        assert_eq!(
            extract_problem_info(source),
            Some(("1850".to_string(), "A".to_string()))
        );
        assert_eq!(
            extract_problem_info("# https://codeforces.com/contest/1910/problem/B1"),
            Some(("1910".to_string(), "B1".to_string()))
        );
        assert_eq!(extract_problem_info("int main() {}"), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("A. Sum"), "A. Sum");
        assert_eq!(sanitize("E. a/b: c"), "E. a_b_ c");
        assert_eq!(sanitize(".."), "_");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn prop_test_file_names_are_zero_padded(id in 1u32..100) {
            let (input, answer) = test_file_names("main", &id.to_string());
            prop_assert_eq!(input, format!("main.{:02}.in", id));
            prop_assert_eq!(answer, format!("main.{:02}.ans", id));
        }

        #[test]
        fn prop_sanitized_name_is_one_component(name in "\\PC{0,40}") {
            let cleaned = sanitize(&name);
            prop_assert!(!cleaned.is_empty());
            prop_assert_eq!(Path::new(&cleaned).components().count(), 1);
        }
    }
}
