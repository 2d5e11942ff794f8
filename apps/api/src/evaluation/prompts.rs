// All LLM prompt templates for the evaluation module.
// Placeholders in `{braces}` are substituted with `fill` before sending.

/// Question generation (English and any language without a dedicated template).
/// Replace: {count}, {language_name}, {skills}, {experience_count}, {project_count}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Based on this candidate's profile, generate exactly {count} interview questions in {language_name}.

Candidate Profile:
- Skills: {skills}
- Experience: {experience_count} positions
- Projects: {project_count} projects

Generate questions in these categories:
1. {technical} Technical questions about their skills
2. {behavioral} Behavioral questions about teamwork and problem-solving
3. {experience} Questions about their experience and projects
4. {situational} Situational questions
5. {career} Question(s) about career goals

Return each question on a new line, numbered 1-{count}."#;

/// Question generation in Vietnamese. Same placeholders as the English template.
pub const QUESTIONS_PROMPT_TEMPLATE_VI: &str = r#"Dựa trên hồ sơ của ứng viên này, hãy tạo chính xác {count} câu hỏi phỏng vấn bằng tiếng Việt.

Hồ sơ ứng viên:
- Kỹ năng: {skills}
- Kinh nghiệm: {experience_count} vị trí
- Dự án: {project_count} dự án

Tạo câu hỏi theo các danh mục sau:
1. {technical} câu hỏi kỹ thuật về kỹ năng của họ
2. {behavioral} câu hỏi hành vi về làm việc nhóm và giải quyết vấn đề
3. {experience} câu hỏi về kinh nghiệm và dự án của họ
4. {situational} câu hỏi tình huống
5. {career} câu hỏi về mục tiêu nghề nghiệp

Trả về mỗi câu hỏi trên một dòng mới, đánh số từ 1-{count}."#;

/// Reference answer used for lexical comparison. Replace: {question}
pub const IDEAL_ANSWER_PROMPT_TEMPLATE: &str = r#"Provide a concise, professional answer (100-150 words) to this interview question:
"{question}"

Focus on being specific, relevant, and showing competence."#;

/// Structured feedback. Replace: {question}, {answer}, {ideal_answer}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Evaluate this interview answer and provide constructive feedback:

Question: "{question}"

Candidate's Answer: "{answer}"

Ideal Answer: "{ideal_answer}"

Provide feedback in this exact format:
SCORE: [number from 0-100]
STRENGTHS: [list 2-3 positive aspects]
IMPROVEMENTS: [list 2-3 areas to improve]
SUGGESTIONS: [list 2-3 specific suggestions]

Be constructive and specific in your feedback."#;

/// Follow-up question. Replace: {question}, {answer}
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"Based on this interview exchange, generate a relevant follow-up question:

Original Question: "{question}"
Candidate's Answer: "{answer}"

Generate a follow-up question that:
1. Builds on their answer
2. Seeks more specific details
3. Is appropriate for an interview setting

Return only the follow-up question."#;

/// End-of-interview synthesis. Replace: {average_score}, {transcript}
pub const OVERALL_PROMPT_TEMPLATE: &str = r#"Based on this complete interview transcript and performance, provide an overall evaluation:

Average Score: {average_score}/100

Transcript:
{transcript}

Provide evaluation in this format:
OVERALL_SCORE: [0-100]
TECHNICAL_SKILLS: [0-100]
COMMUNICATION: [0-100]
PROBLEM_SOLVING: [0-100]
SUMMARY: [2-3 sentence summary]
STRENGTHS: [top 3 strengths]
AREAS_FOR_IMPROVEMENT: [top 3 areas]
RECOMMENDATIONS: [3-4 specific recommendations]"#;

/// Substitutes `{key}` placeholders in a single pass, so values that themselves
/// contain braces (candidate answers often do) are never re-expanded.
/// Unknown placeholders are left as written.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_end = after.find('}');
        match key_end.and_then(|end| {
            let key = &after[..end];
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| (end, *v))
        }) {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_known_placeholders() {
        let out = fill("Q: {question} / A: {answer}", &[("question", "Why?"), ("answer", "Because.")]);
        assert_eq!(out, "Q: Why? / A: Because.");
    }

    #[test]
    fn test_fill_does_not_expand_inside_values() {
        let out = fill(
            "{answer} | {ideal_answer}",
            &[("answer", "I wrote {ideal_answer}"), ("ideal_answer", "ideal")],
        );
        assert_eq!(out, "I wrote {ideal_answer} | ideal");
    }

    #[test]
    fn test_fill_keeps_unknown_and_unbalanced_braces() {
        assert_eq!(fill("{unknown} and {", &[]), "{unknown} and {");
    }

    #[test]
    fn test_templates_use_only_their_placeholders() {
        let out = fill(
            FEEDBACK_PROMPT_TEMPLATE,
            &[("question", "q"), ("answer", "a"), ("ideal_answer", "i")],
        );
        assert!(!out.contains("{question}"));
        assert!(!out.contains("{ideal_answer}"));
        assert!(out.contains("SCORE: [number from 0-100]"));
    }
}
