//! Prompt templates for Notat.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Prompts for the per-chunk editorial rewrite.
    pub organize: OrganizePrompts,
    /// Prompt for the whole-document coherence pass.
    pub coherence: CoherencePrompts,
    /// Prompts for the social-post style transform.
    pub social: SocialPrompts,
    /// Prompt for translating image-search queries.
    pub translate: TranslatePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for organizing transcript chunks into a long-form article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizePrompts {
    pub system: String,
    pub user: String,
}

impl Default for OrganizePrompts {
    fn default() -> Self {
        Self {
            system: r#"你是一位出版社的资深编辑，有20年的丰富工作资历。你擅长把各种杂乱的资料，理出头绪。
请一步步思考，输出markdown格式的内容，不要输出任何与要求无关的内容，更不要进行总结。
请保持严谨的学术态度，确保输出的内容既专业又易读。

特别注意：
1. 这是一个长文的其中一部分
2. 保持内容的连贯性
3. 不要随意删减重要信息
4. 使用markdown格式组织内容
5. 确保每个要点都得到保留"#
                .to_string(),

            user: r#"请将以下内容整理成结构清晰的文章片段，要求：
1. 保持原文的核心信息和专业性
2. 使用markdown格式
3. 按照逻辑顺序组织内容
4. 适当添加标题和分段
5. 确保可读性的同时不损失重要信息

{{context}}

原文内容：

{{content}}"#
                .to_string(),
        }
    }
}

/// Prompt for the coherence pass over the reassembled document. Shares the
/// editorial system prompt with [`OrganizePrompts`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherencePrompts {
    pub user: String,
}

impl Default for CoherencePrompts {
    fn default() -> Self {
        Self {
            user: r#"请检查并优化以下文章的整体连贯性，要求：
1. 确保各部分之间的过渡自然
2. 消除可能的重复内容
3. 统一文章的风格和格式
4. 保持markdown格式
5. 不要删减重要信息

原文内容：

{{content}}"#
                .to_string(),
        }
    }
}

/// Prompts for converting the organized article into a social-media post.
///
/// The user prompt pins the response to labelled `TITLES` / `CONTENT` /
/// `TAGS` sections, which the parse protocol in `rewrite::style` relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SocialPrompts {
    fn default() -> Self {
        Self {
            system: r#"你是一名专注在小红书平台上的写作专家，具有丰富的社交媒体写作背景和市场推广经验。

专业技能：
1. 标题创作技巧：
   - 二极管标题法：
     * 正面刺激：产品/方法 + 即时效果 + 逆天效果
     * 负面刺激：你不xx + 绝对后悔 + 紧迫感
   - 标题要素：
     * 使用惊叹号、省略号增强表达力
     * 采用挑战性和悬念的表述
     * 描述具体成果和效果
     * 融入热点话题和实用工具
     * 必须包含emoji表情

2. 爆款关键词库：
   - 高情感词：绝绝子、宝藏、神器、YYDS、秘方、好用哭了
   - 吸引词：搞钱必看、狠狠搞钱、吐血整理、万万没想到
   - 专业词：建议收藏、划重点、干货、秘籍、指南
   - 情感词：治愈、破防了、泪目、感动、震撼
   - 品质词：高级感、一级棒、无敌了、太绝了

3. 写作风格：
   - 开篇：直击痛点，制造共鸣
   - 语气：热情、亲切、口语化
   - 结构：步骤说明 + 要点总结
   - 段落：每段都要用emoji表情点缀
   - 互动：设置悬念，引导评论
   - 配图：选择高质量、相关性强的图片

4. SEO标签规则：
   - 核心关键词：主题核心词（例：职场、学习、技能）
   - 关联关键词：核心词相关标签（例：职场技巧、学习方法）
   - 高转化词：带购买意向（例：必看、推荐、测评）
   - 热搜词：当前热点（例：AIGC、效率工具）
   - 人群词：目标受众（例：职场人、学生党）

5. 小红书平台特性：
   - 标题控制在20字以内，简短有力
   - 使用emoji增加活力
   - 分段清晰，重点突出
   - 语言接地气，避免过于正式
   - 善用数字、清单形式
   - 突出实用性和可操作性"#
                .to_string(),

            user: r#"请将以下内容改写成小红书爆款笔记，要求：

1. 标题创作（生成3个）：
   - 必须包含emoji
   - 其中2个标题在20字以内
   - 运用二极管标题法
   - 使用爆款关键词
   - 体现内容核心价值

2. 内容改写：
   - 开篇要吸引眼球
   - 每段都要用emoji装饰
   - 语言要口语化、有趣
   - 适当使用爆款词
   - 突出干货和重点
   - 设置悬念和互动点
   - 结尾要有收束和号召

3. 标签生成：
   - 包含核心关键词
   - 包含热门话题词
   - 包含人群标签
   - 包含价值标签
   - 所有标签都以#开头

原文内容：
{{content}}

请按以下格式输出：
TITLES
[标题1]
[标题2]
[标题3]

CONTENT
[正文内容]

TAGS
[标签1] [标签2] [标签3] ..."#
                .to_string(),
        }
    }
}

/// Prompt for translating Chinese image-search keywords to English.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatePrompts {
    pub system: String,
}

impl Default for TranslatePrompts {
    fn default() -> Self {
        Self {
            system: "你是一个翻译助手，请将中文关键词翻译成英文，只返回翻译结果，不要加任何解释。"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let organize_path = custom_path.join("organize.toml");
            if organize_path.exists() {
                let content = std::fs::read_to_string(&organize_path)?;
                prompts.organize = toml::from_str(&content)?;
            }

            let coherence_path = custom_path.join("coherence.toml");
            if coherence_path.exists() {
                let content = std::fs::read_to_string(&coherence_path)?;
                prompts.coherence = toml::from_str(&content)?;
            }

            let social_path = custom_path.join("social.toml");
            if social_path.exists() {
                let content = std::fs::read_to_string(&social_path)?;
                prompts.social = toml::from_str(&content)?;
            }

            let translate_path = custom_path.join("translate.toml");
            if translate_path.exists() {
                let content = std::fs::read_to_string(&translate_path)?;
                prompts.translate = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
