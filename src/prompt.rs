use crate::types::{AnnotatorError, Result};
use serde::Serialize;

/// One chat turn in a rendered request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// A fixed demonstration input/output pair included in every prompt to
/// steer the model's output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exemplar {
    pub input: String,
    pub output: String,
}

impl Exemplar {
    fn new(input: &str, output: &str) -> Self {
        Self { input: input.to_string(), output: output.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Segmentation,
    Classification,
}

/// An immutable few-shot prompt template for one annotation task.
///
/// Shared read-only across all chunks of a pass. Rendering produces the
/// instruction as a system turn, each exemplar as a (user, assistant) turn
/// pair in listed order, then the runtime input as the final user turn.
#[derive(Debug, Clone)]
pub struct AnnotationTask {
    pub kind: TaskKind,
    instruction: String,
    exemplars: Vec<Exemplar>,
}

impl AnnotationTask {
    /// Build a task. Fails if `exemplars` is empty: without few-shot
    /// grounding the model does not reliably follow the output format.
    pub fn new(
        kind: TaskKind,
        instruction: impl Into<String>,
        exemplars: Vec<Exemplar>,
    ) -> Result<Self> {
        if exemplars.is_empty() {
            return Err(AnnotatorError::EmptyExemplars);
        }
        Ok(Self { kind, instruction: instruction.into(), exemplars })
    }

    pub fn exemplars(&self) -> &[Exemplar] {
        &self.exemplars
    }

    /// Render the complete multi-turn payload for one runtime input.
    pub fn render(&self, input: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + self.exemplars.len() * 2);
        messages.push(ChatMessage::system(&self.instruction));
        for exemplar in &self.exemplars {
            messages.push(ChatMessage::user(&exemplar.input));
            messages.push(ChatMessage::assistant(&exemplar.output));
        }
        messages.push(ChatMessage::user(input));
        messages
    }
}

const SEGMENTATION_INSTRUCTION: &str = "你是一个精通中文热爱美食的语言学家, 你需要帮忙给用户输入的美食分词。\
反思一下，你给出的结果中，词语的数量是否和输入的词数一致。不要多加也不要遗漏。\
回答之前，请反复确认输出是每个词语的分词结果，每个分词后的部分之间用|隔开。不要有其他任何额外的内容或者空行。";

const CLASSIFICATION_INSTRUCTION: &str = "你是一个精通中文热爱美食的语言学家, 你需要帮忙给用户输入分词后的各个部分分类。\
可能的类别有以下几种：\
1. 材料: 表示是这个菜的主要原材料之一。例如`西红柿|炒|蛋`中的`西红柿`和`蛋`\
2. 形式: 表示这个菜的大类别。例如`牛肉|面`中的`面`\
3. 工艺: 表示这个菜制作工艺。例如`手撕|羊肉`中的`手撕`\
4. 风味: 表示这个菜的口味。例如`酸辣|土豆丝`中的`酸辣`\
5. 地名：表示这个菜的发源或者流行的地方。例如`重庆|小面`中的`重庆`\
6. 品牌：表示这个菜的发源或者流行的品牌。例如`正新|鸡排`中的`正新`\
7. 其他：表示这个词语不属于上述任何一类。\
回答之前，请确认如下几点\
1. 你给出的结果中，词语的数量是否和输入的词数一致。不要多加也不要遗漏。\
2. 输出的分类和输入分词结果一一对应，每个分类之间用|隔开。不要有空格\
3. 分类名要准确，不能出现以上7种分类之外的分类。\
4. 输出只有一行。\
5. 不要输出用户输入的内容\
6. 反复确认，不要有分类之外的任何内容！！！";

/// The built-in segmentation task: dish name in, `|`-joined parts out.
pub fn segmentation_task() -> Result<AnnotationTask> {
    AnnotationTask::new(
        TaskKind::Segmentation,
        SEGMENTATION_INSTRUCTION,
        vec![
            Exemplar::new("酸辣土豆丝", "酸辣|土豆丝"),
            Exemplar::new("水煮肉片", "水煮|肉片"),
            Exemplar::new("腊味饭", "腊味|饭"),
            Exemplar::new("正新鸡排", "正新|鸡排"),
            Exemplar::new("小炒黄牛肉", "小炒|黄牛肉"),
            Exemplar::new("牛气冲天堡", "牛气|冲天|堡"),
            Exemplar::new("孜然羊肉盖烧饭", "孜然|羊肉|盖烧饭"),
            Exemplar::new("富士苹果", "富士|苹果"),
            Exemplar::new("椒麻小酥肉", "椒麻|小酥肉"),
            Exemplar::new("正山小种", "正山|小种"),
        ],
    )
}

/// The built-in classification task: `|`-joined parts in, one category per
/// part out of the closed seven-category set.
pub fn classification_task() -> Result<AnnotationTask> {
    AnnotationTask::new(
        TaskKind::Classification,
        CLASSIFICATION_INSTRUCTION,
        vec![
            Exemplar::new("酸辣|土豆丝", "风味|材料"),
            Exemplar::new("水煮|肉片", "工艺|材料"),
            Exemplar::new("腊味|饭", "风味|形式"),
            Exemplar::new("正新|鸡排", "品牌|材料"),
            Exemplar::new("小炒|黄牛肉", "工艺|材料"),
            Exemplar::new("牛气|冲天|堡", "其他|其他|形式"),
            Exemplar::new("孜然|羊肉|盖烧饭", "材料|材料|形式"),
            Exemplar::new("富士|苹果", "地名|材料"),
            Exemplar::new("椒麻|小酥肉", "风味|材料"),
            Exemplar::new("正山|小种", "地名|材料"),
        ],
    )
}
