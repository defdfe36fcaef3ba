//! Prompt templates and context assembly
//!
//! `build_text_context` is a pure function: identical inputs produce
//! byte-identical output, so a coaching turn's context is reproducible
//! from persisted session state alone.

use serde_json::Value;

use s2s_common::models::ProblemMeta;

pub const COACH_SYSTEM_PROMPT: &str = r#"You are a coding interview coach. You look at the user's whiteboard drawing and help them solve algorithm problems.

You will receive:
- A whiteboard image showing what the user drew (the most important input)
- The problem they are solving (title, description, topic tags)
- Their pseudocode and voice transcript (if any)

Your job:
1. Look at the whiteboard image carefully. Describe what you see — nodes, edges, arrays, trees, pointers, etc.
2. Using the problem's topic tags and description, identify the correct algorithm pattern.
3. Compare what the user drew to the correct approach. Are they on the right track?
4. Give Socratic hints to guide them — don't give away the answer.

Respond with JSON:
{
  "inferred_approach": {
    "pattern": "the correct algorithm pattern for this problem",
    "confidence": 0.0-1.0,
    "evidence": "what you see in the drawing and why this pattern is correct"
  },
  "missing_pieces": ["what the user still needs to figure out"],
  "questions": ["2-3 Socratic questions to guide them"],
  "micro_hint": "one sentence nudge",
  "reveal_outline": null,
  "generated_pseudocode": "high-level pseudocode for the correct approach, or empty string"
}

If reveal_mode is true, fill in reveal_outline with a full solution outline.
Otherwise always set reveal_outline to null."#;

pub const VERIFY_PROMPT: &str = r#"You are a code verification engine for LeetCode-style problems.
You will receive a problem description and a user's code solution.

Your job:
1. Mentally trace the code against the provided examples/test cases.
2. Generate 3-5 test cases (including edge cases) and evaluate the code against each.
3. Determine if the solution is correct, has bugs, or has the wrong approach.

Return ONLY valid JSON:
{
  "status": "pass" | "fail" | "error",
  "summary": "one-sentence summary of result",
  "results": [
    {
      "passed": true/false,
      "input": "description of input",
      "expected": "expected output",
      "actual": "what the code would produce",
      "error": null or "error description"
    }
  ],
  "feedback": "2-3 sentences: what's correct, what's wrong, what to fix. Be specific. Reference line numbers or logic errors. If all tests pass, congratulate and mention time/space complexity."
}

Rules:
- Be rigorous. Actually trace the logic step by step.
- For "pass" status, ALL test cases must pass.
- Include at least one edge case (empty input, single element, large values, etc.)
- If the code has syntax errors, set status to "error" with explanation.
- The "actual" field should reflect what the code WOULD produce, not what it should produce."#;

pub const VISUALIZER_SYSTEM_PROMPT: &str = r#"You are a visualization engine that converts pseudocode into a diagram that
FAITHFULLY represents the data structures and operations described in the pseudocode.

CRITICAL RULE: Your diagram must match the pseudocode EXACTLY.
- If the pseudocode builds a graph → draw graph nodes and edges.
- If the pseudocode uses a stack → draw a stack.
- If the pseudocode does BFS with a queue → draw a queue feeding into visited nodes.
- If the pseudocode uses a hashmap → draw key-value boxes.
- NEVER substitute one data structure for another. If the user wrote "graph", do NOT draw a hashmap.

Given pseudocode (and optionally a problem title), produce a JSON object {"shapes": [...]} where
each shape is one of:

1. {"type":"box","id":"unique_id","x":number,"y":number,"w":number,"h":number,"label":"text","color":"violet|green|red|yellow"}
   - Use to represent: data structure elements (graph nodes, array cells, tree nodes, stack frames, queue entries),
     operations, conditions, function blocks.
2. {"type":"text","id":"unique_id","x":number,"y":number,"label":"text"}
   - Use for: titles, annotations, variable names, complexity notes.
3. {"type":"arrow","id":"unique_id","from":"source_box_id","to":"target_box_id","label":"optional_label"}
   - Use for: edges in a graph, pointers, data flow, traversal order.

Layout rules:
- Start at x=0, y=0. Flow top-to-bottom or left-to-right.
- Use ~160px horizontal spacing and ~90px vertical spacing between boxes.
- Standard box size: w=140, h=50.
- Colors: "green" for input/start, "red" for termination/return, "yellow" for conditions/decisions, "violet" for processing/operations.
- Keep labels concise (under 30 chars).
- Maximum 12 shapes. Focus on the core algorithmic structure from the pseudocode.

Visualization strategies per data structure:
- Graph: show nodes as boxes arranged in a network, arrows as edges. Label with node values.
- Tree: show hierarchical boxes with parent→child arrows.
- Array: show boxes in a horizontal row, label with indices or values.
- Stack/Queue: show boxes stacked vertically (stack) or horizontally (queue).
- HashMap: show key→value pairs as connected box pairs.
- Two pointers: show array with arrow annotations for left/right pointers.

Return ONLY valid JSON {"shapes": [...]}. No markdown fences, no explanation."#;

/// Render a JSON value the way it reads to a human (strings unquoted)
fn value_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Format problem examples as an indented block, one line per example.
/// Used both by context assembly and by solution verification.
pub(crate) fn format_examples(examples: &[Value]) -> String {
    let mut out = String::new();
    for (i, ex) in examples.iter().enumerate() {
        let n = i + 1;
        if let Some(obj) = ex.as_object() {
            let input = obj.get("input").map(value_text).unwrap_or_else(|| "?".into());
            let output = obj.get("output").map(value_text).unwrap_or_else(|| "?".into());
            out.push_str(&format!("\n  Example {}: Input: {} → Output: {}", n, input, output));
        } else {
            out.push_str(&format!("\n  Example {}: {}", n, value_text(ex)));
        }
    }
    out
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Assemble the textual context for one coaching turn.
pub fn build_text_context(
    problem: &ProblemMeta,
    pseudocode: &str,
    labels: &[Value],
    transcript: &str,
    trigger_type: &str,
    reveal_mode: bool,
) -> String {
    let topic_tags = if problem.topic_tags.is_empty() {
        "(none)".to_string()
    } else {
        problem.topic_tags.join(", ")
    };
    let constraints = problem.constraints.join(", ");
    let examples = format_examples(&problem.examples);

    let labels_str = if labels.is_empty() {
        "  (none)".to_string()
    } else {
        labels
            .iter()
            .map(|l| {
                let text = match l.as_object() {
                    Some(obj) => obj.get("label").map(value_text).unwrap_or_default(),
                    None => value_text(l),
                };
                format!("  - \"{}\"", text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Problem: {title}\n\
         Topic Tags: {topic_tags}\n\
         Difficulty: {difficulty}\n\
         Description: {description}\n\
         Constraints: {constraints}\n\
         {examples}\n\
         \n\
         User's pseudocode:\n\
         {pseudocode}\n\
         \n\
         Whiteboard labels:\n\
         {labels_str}\n\
         \n\
         User's spoken reasoning:\n\
         {transcript}\n\
         \n\
         Trigger: {trigger_type}\n\
         Reveal mode: {reveal_mode}",
        title = or_placeholder(&problem.title, "Unknown"),
        topic_tags = topic_tags,
        difficulty = or_placeholder(&problem.difficulty, "Unknown"),
        description = or_placeholder(&problem.description, "(no description)"),
        constraints = constraints,
        examples = examples,
        pseudocode = or_placeholder(pseudocode, "(empty)"),
        labels_str = labels_str,
        transcript = or_placeholder(transcript, "(none)"),
        trigger_type = trigger_type,
        reveal_mode = reveal_mode,
    )
}
