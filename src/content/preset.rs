//! 预置内容：五个学科的知识点与题目
//!
//! 正式部署时由外部管理工具替换；这份内置内容保证开箱即用并支撑测试。

use chrono::Utc;

use super::{ContentStore, KnowledgeItem, Question, QuestionType, Subject};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[allow(clippy::too_many_arguments)]
fn question(
    subject: Subject,
    topic: (&str, &str),
    question_type: QuestionType,
    difficulty: u8,
    content: &str,
    options: Option<&[&str]>,
    correct_answer: &str,
    explanation: &str,
    is_transfer: bool,
) -> Question {
    Question {
        id: new_id(),
        subject,
        topic_id: topic.0.to_string(),
        topic_name: topic.1.to_string(),
        question_type,
        difficulty,
        content: content.to_string(),
        options: options.map(|opts| opts.iter().map(|s| s.to_string()).collect()),
        correct_answer: correct_answer.to_string(),
        explanation: explanation.to_string(),
        is_transfer,
        created_at: Utc::now(),
    }
}

fn knowledge(
    subject: Subject,
    topic: (&str, &str),
    title: &str,
    content: &str,
    key_points: &[&str],
    common_mistakes: &[&str],
    intuition_pumps: &[&str],
) -> KnowledgeItem {
    KnowledgeItem {
        id: new_id(),
        subject,
        topic_id: topic.0.to_string(),
        topic_name: topic.1.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        key_points: key_points.iter().map(|s| s.to_string()).collect(),
        common_mistakes: common_mistakes.iter().map(|s| s.to_string()).collect(),
        intuition_pumps: intuition_pumps.iter().map(|s| s.to_string()).collect(),
        tags: Vec::new(),
        created_at: Utc::now(),
    }
}

/// 写入全部预置内容
pub fn seed(store: &mut ContentStore) {
    seed_chinese(store);
    seed_math(store);
    seed_english(store);
    seed_history(store);
    seed_politics(store);
}

fn seed_chinese(store: &mut ContentStore) {
    let rhetoric = ("ch_rhetoric", "修辞手法");
    let poetry = ("ch_poetry", "古诗鉴赏");

    store.add_knowledge(knowledge(
        Subject::Chinese,
        rhetoric,
        "常见修辞手法详解",
        "修辞手法是语言表达的艺术技巧，常见的包括：\n\
         1. 比喻：用相似事物打比方，如“月亮像一个银盘”\n\
         2. 拟人：把事物人格化，如“春风轻轻抚摸大地”\n\
         3. 夸张：故意夸大或缩小，如“飞流直下三千尺”\n\
         4. 排比：结构相同的句子并列，增强气势\n\
         5. 对偶：字数相等、结构相同的两句对称",
        &["比喻需要有本体和喻体", "拟人赋予事物人的特征", "夸张要合理不失真"],
        &["混淆比喻和拟人", "把所有形容词都当作夸张"],
        &["想想事物像什么？是比喻；想想事物会做什么人的动作？是拟人"],
    ));

    store.add_knowledge(knowledge(
        Subject::Chinese,
        poetry,
        "唐诗宋词鉴赏方法",
        "古诗鉴赏的基本步骤：了解作者背景，理解字面意思，分析意象和意境，\
         体会情感和主题，欣赏艺术手法。常见意象含义：月亮-思乡、柳-离别、\
         梅花-高洁、菊花-隐逸。",
        &["意象是寄托情感的具体事物", "意境是整体氛围", "要结合时代背景理解"],
        &["只看字面意思忽略深层含义", "不了解作者导致误解诗意"],
        &["作者想表达什么情感？用了什么景物来表达？"],
    ));

    store.add_question(question(
        Subject::Chinese,
        rhetoric,
        QuestionType::Choice,
        2,
        "下列句子使用了什么修辞手法？“春风又绿江南岸”",
        Some(&["A. 比喻", "B. 拟人", "C. 夸张", "D. 排比"]),
        "B",
        "“绿”字使春风具有了人的动作（使……变绿），这是拟人手法",
        false,
    ));

    store.add_question(question(
        Subject::Chinese,
        rhetoric,
        QuestionType::Judgment,
        1,
        "“他的心像一块石头一样硬”这句话使用了拟人手法。",
        None,
        "错误",
        "这是比喻手法，用石头来比喻心硬，有本体（心）和喻体（石头）",
        false,
    ));

    store.add_question(question(
        Subject::Chinese,
        rhetoric,
        QuestionType::Application,
        4,
        "请用比喻和拟人两种修辞手法，分别写一句描写“月光”的句子，并说明为什么这样写能更好地表达情感。",
        None,
        "开放性答案",
        "比喻示例：月光如水银泻地。拟人示例：月光温柔地亲吻大地。",
        true,
    ));

    store.add_question(question(
        Subject::Chinese,
        poetry,
        QuestionType::Qa,
        3,
        "请分析李白《静夜思》中“床前明月光，疑是地上霜”的意境和情感。",
        None,
        "诗人用月光如霜的意象，营造清冷孤寂的意境，表达思乡之情",
        "月光本身就是思乡意象，“霜”字增添凄凉感，表达游子思乡",
        false,
    ));
}

fn seed_math(store: &mut ContentStore) {
    let quadratic = ("math_quadratic", "一元二次方程");
    let function = ("math_function", "函数基础");

    store.add_knowledge(knowledge(
        Subject::Math,
        quadratic,
        "一元二次方程的解法",
        "一元二次方程 ax² + bx + c = 0 (a≠0) 的解法：因式分解法、配方法、\
         公式法 x = (-b ± √(b²-4ac)) / 2a。判别式 Δ = b²-4ac：Δ>0 两个不等实根；\
         Δ=0 两个相等实根；Δ<0 无实根。",
        &["公式法是万能方法", "判别式决定根的情况", "a不能为0"],
        &["忘记a≠0的条件", "公式中符号错误", "判别式计算错误"],
        &["先看能否因式分解，不能就用公式法"],
    ));

    store.add_knowledge(knowledge(
        Subject::Math,
        function,
        "函数的概念与性质",
        "函数是一种对应关系：对于集合A中的每个元素x，在集合B中都有唯一确定的\
         元素y与之对应。三要素：定义域、值域、对应法则。基本性质：单调性、\
         奇偶性、周期性。",
        &["一个x只能对应一个y", "定义域是自变量的取值范围", "值域是函数值的范围"],
        &["把一对多的关系当成函数", "忘记考虑定义域的限制"],
        &["函数就像自动售货机：投入一个硬币，出来一个固定商品"],
    ));

    store.add_question(question(
        Subject::Math,
        quadratic,
        QuestionType::Choice,
        2,
        "方程 x² - 5x + 6 = 0 的解是？",
        Some(&["A. x=2 或 x=3", "B. x=-2 或 x=-3", "C. x=1 或 x=6", "D. x=-1 或 x=-6"]),
        "A",
        "因式分解：(x-2)(x-3)=0，所以 x=2 或 x=3",
        false,
    ));

    store.add_question(question(
        Subject::Math,
        quadratic,
        QuestionType::Fill,
        3,
        "方程 2x² + 3x - 2 = 0 的两根之和为____，两根之积为____。",
        None,
        "-3/2, -1",
        "由韦达定理：x₁+x₂=-b/a=-3/2，x₁x₂=c/a=-2/2=-1",
        false,
    ));

    store.add_question(question(
        Subject::Math,
        quadratic,
        QuestionType::Application,
        4,
        "一个矩形的长比宽多3米，面积为40平方米。请建立方程并求出这个矩形的长和宽。",
        None,
        "设宽为x，则x(x+3)=40，解得x=5，所以宽5米，长8米",
        "这是一元二次方程的实际应用，需要正确建立方程模型",
        true,
    ));

    store.add_question(question(
        Subject::Math,
        function,
        QuestionType::Judgment,
        2,
        "y = x² 是一个函数，因为每个x值都对应唯一的y值。",
        None,
        "正确",
        "对于任意x，x²都有唯一确定的值，满足函数定义",
        false,
    ));
}

fn seed_english(store: &mut ContentStore) {
    let tense = ("en_tense", "时态");
    let passive = ("en_passive", "被动语态");

    store.add_knowledge(knowledge(
        Subject::English,
        tense,
        "英语常用时态详解",
        "英语时态是表示动作发生时间和状态的语法形式：一般现在时表示习惯、事实；\
         一般过去时表示过去发生的事；现在进行时表示正在进行；现在完成时表示\
         过去发生对现在有影响；过去进行时表示过去某时正在进行。",
        &["时态由动词形式体现", "注意时间标志词", "完成时强调对现在的影响"],
        &["混淆一般过去时和现在完成时", "第三人称单数忘记加s"],
        &["看时间词：yesterday用过去时，now用进行时，already用完成时"],
    ));

    store.add_knowledge(knowledge(
        Subject::English,
        passive,
        "被动语态的构成与用法",
        "被动语态表示主语是动作的承受者，构成为 be + 过去分词，be 动词随时态\
         变化。使用场景：不知道动作执行者、强调动作承受者、科技文章。",
        &["be动词随时态变化", "过去分词形式不变", "by引出动作执行者"],
        &["be动词和过去分词形式不匹配", "不及物动词无被动语态"],
        &["主语是“被……的”就用被动语态"],
    ));

    store.add_question(question(
        Subject::English,
        tense,
        QuestionType::Choice,
        2,
        "I ____ English since I was 10 years old.",
        Some(&["A. learn", "B. learned", "C. have learned", "D. am learning"]),
        "C",
        "“since”是现在完成时的标志词，表示从过去开始持续到现在",
        false,
    ));

    store.add_question(question(
        Subject::English,
        tense,
        QuestionType::Fill,
        3,
        "While I ____(read) a book, my phone ____(ring).",
        None,
        "was reading, rang",
        "while引导的从句用过去进行时，主句用一般过去时，表示过去进行中被打断",
        false,
    ));

    store.add_question(question(
        Subject::English,
        tense,
        QuestionType::Application,
        4,
        "请用三种不同的时态（一般现在时、现在进行时、现在完成时）分别造一个关于“学习编程”的句子，并解释每个时态的用法。",
        None,
        "开放性答案",
        "例：I learn programming every day.(习惯) I am learning Python now.(正在进行) I have learned three languages.(完成对现在有影响)",
        true,
    ));

    store.add_question(question(
        Subject::English,
        passive,
        QuestionType::Judgment,
        2,
        "The letter was wrote by Tom. 这个句子的被动语态使用正确。",
        None,
        "错误",
        "write的过去分词是written，不是wrote。正确句子：The letter was written by Tom.",
        false,
    ));
}

fn seed_history(store: &mut ContentStore) {
    let reform = ("hist_reform", "改革开放");
    let ancient = ("hist_ancient", "秦朝统一");

    store.add_knowledge(knowledge(
        Subject::History,
        reform,
        "中国改革开放历程",
        "改革开放是1978年以来中国的基本国策：1978年十一届三中全会开启；对内改革\
         （农村家庭联产承包、城市国企改革）、对外开放（经济特区、沿海开放城市）；\
         实现了从计划经济到市场经济的转变。",
        &["1978年是开始时间", "改革从农村开始", "深圳是第一个经济特区"],
        &["混淆改革开放与新中国成立的时间", "不理解市场经济与计划经济的区别"],
        &["改革=内部调整，开放=对外交流"],
    ));

    store.add_knowledge(knowledge(
        Subject::History,
        ancient,
        "秦始皇统一六国",
        "秦朝是中国第一个统一的封建王朝：公元前221年统一；统一文字（小篆）、\
         度量衡、货币；废分封、行郡县、设三公九卿；结束了春秋战国的分裂局面，\
         建立了中央集权制度。",
        &["公元前221年统一", "郡县制取代分封制", "书同文车同轨"],
        &["混淆秦朝与其他朝代的制度", "不理解郡县制的意义"],
        &["秦始皇的“统一”包括领土统一和制度统一两层含义"],
    ));

    store.add_question(question(
        Subject::History,
        reform,
        QuestionType::Choice,
        2,
        "中国改革开放的开始标志是？",
        Some(&[
            "A. 1949年新中国成立",
            "B. 1978年十一届三中全会",
            "C. 1992年南方谈话",
            "D. 2001年加入WTO",
        ]),
        "B",
        "1978年十一届三中全会作出了改革开放的伟大决策",
        false,
    ));

    store.add_question(question(
        Subject::History,
        reform,
        QuestionType::Qa,
        3,
        "请简述改革开放初期农村改革的主要内容及其意义。",
        None,
        "实行家庭联产承包责任制，调动农民积极性，解放农村生产力",
        "家庭联产承包责任制打破了人民公社体制，农民有了生产自主权",
        false,
    ));

    store.add_question(question(
        Subject::History,
        reform,
        QuestionType::Application,
        4,
        "结合改革开放的历史经验，分析“解放思想”与“经济发展”之间的关系。请举例说明。",
        None,
        "开放性答案",
        "解放思想是前提，突破旧观念才能推动改革；如突破姓资姓社的争论才有市场经济",
        true,
    ));

    store.add_question(question(
        Subject::History,
        ancient,
        QuestionType::Judgment,
        2,
        "秦始皇统一六国后实行分封制，把土地分给功臣。",
        None,
        "错误",
        "秦始皇废除分封制，实行郡县制，由中央直接管理地方",
        false,
    ));
}

fn seed_politics(store: &mut ContentStore) {
    let economy = ("pol_economy", "市场经济");
    let citizen = ("pol_citizen", "公民权利");

    store.add_knowledge(knowledge(
        Subject::Politics,
        economy,
        "社会主义市场经济体制",
        "社会主义市场经济是中国特色的经济体制：坚持公有制主体地位，多种所有制\
         共同发展；市场在资源配置中起决定性作用，更好发挥政府作用；既发挥市场\
         效率，又体现社会公平。",
        &["市场起决定性作用", "公有制为主体", "政府要更好发挥作用"],
        &["认为市场经济就是资本主义", "忽视政府作用"],
        &["市场是“看不见的手”，政府是“看得见的手”"],
    ));

    store.add_knowledge(knowledge(
        Subject::Politics,
        citizen,
        "公民的基本权利与义务",
        "我国公民享有政治权利、人身权利、社会经济权利，同时要履行维护国家统一、\
         遵守宪法法律、依法纳税等基本义务。权利与义务是统一的、相辅相成的。",
        &["权利和义务是统一的", "选举权需年满18周岁", "公民权利受法律保护"],
        &["只强调权利忽视义务", "混淆公民与人民的概念"],
        &["享受权利的同时要履行义务，就像硬币的两面"],
    ));

    store.add_question(question(
        Subject::Politics,
        economy,
        QuestionType::Choice,
        2,
        "在社会主义市场经济中，资源配置起决定性作用的是？",
        Some(&["A. 政府", "B. 市场", "C. 企业", "D. 个人"]),
        "B",
        "党的十八届三中全会明确提出“市场在资源配置中起决定性作用”",
        false,
    ));

    store.add_question(question(
        Subject::Politics,
        economy,
        QuestionType::Qa,
        3,
        "请解释“市场在资源配置中起决定性作用，更好发挥政府作用”的含义。",
        None,
        "市场通过价格机制调节供需，政府进行宏观调控弥补市场失灵",
        "这是市场与政府关系的核心表述，强调两者的有机结合",
        false,
    ));

    store.add_question(question(
        Subject::Politics,
        economy,
        QuestionType::Application,
        4,
        "结合实际案例，分析政府在应对市场失灵（如疫情期间物资短缺）时应该如何发挥作用。",
        None,
        "开放性答案",
        "政府可采取价格管控、统一调配、增加供给等措施，体现政府的宏观调控作用",
        true,
    ));

    store.add_question(question(
        Subject::Politics,
        citizen,
        QuestionType::Judgment,
        2,
        "公民只享有权利，不需要履行义务。",
        None,
        "错误",
        "权利和义务是统一的，公民在享有权利的同时必须履行相应义务",
        false,
    ));
}
